//! Inkboard Export Library
//!
//! Renders a scene to SVG, rasterizes it to PNG and lays it out on an A4
//! page for printing.

mod error;
pub mod print;
pub mod raster;
pub mod svg;

pub use error::{ExportError, ExportResult, RenderError};
pub use print::{PageOrientation, PrintOptions, render_print_bundle};
pub use raster::{RasterOptions, render_png, svg_to_png};
pub use svg::{SvgOptions, export_bounds, render_svg};
