//! Export errors.

use inkboard_core::ObjectId;
use thiserror::Error;

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid SVG: {0}")]
    Svg(String),
    #[error("Rasterization failed: {0}")]
    Raster(String),
    #[error("PDF conversion failed: {0}")]
    Pdf(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// A single object that could not be drawn. The export skips it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Object {0} has non-finite geometry")]
    NonFinite(ObjectId),
}
