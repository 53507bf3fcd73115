//! Print bundle: the rasterized scene centered on an A4 PDF page.

use crate::error::{ExportError, ExportResult};
use crate::raster::{RasterOptions, render_png};
use crate::svg::{SvgOptions, export_bounds};
use base64::{Engine, engine::general_purpose::STANDARD};
use inkboard_core::Scene;
use kurbo::{Rect, Size};

/// A4 in PostScript points.
pub const A4_SIZE: Size = Size::new(595.28, 841.89);
/// Page margin in points.
pub const PAGE_MARGIN: f64 = 36.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    /// Landscape when the content is wider than tall.
    #[default]
    Auto,
}

#[derive(Debug, Clone)]
pub struct PrintOptions {
    pub orientation: PageOrientation,
    /// Raster resolution multiplier for the embedded image.
    pub scale: f32,
    pub svg: SvgOptions,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            orientation: PageOrientation::Auto,
            scale: 2.0,
            svg: SvgOptions::default(),
        }
    }
}

/// Page size for content of `content` size.
pub fn page_size(orientation: PageOrientation, content: Size) -> Size {
    let landscape = match orientation {
        PageOrientation::Portrait => false,
        PageOrientation::Landscape => true,
        PageOrientation::Auto => content.width > content.height,
    };
    if landscape {
        Size::new(A4_SIZE.height, A4_SIZE.width)
    } else {
        A4_SIZE
    }
}

/// Where an image of `content` size lands on `page`: scaled to fit inside
/// the margins, never enlarged, centered.
pub fn fit_on_page(content: Size, page: Size) -> Rect {
    let available = Size::new(
        (page.width - 2.0 * PAGE_MARGIN).max(1.0),
        (page.height - 2.0 * PAGE_MARGIN).max(1.0),
    );
    let factor = (available.width / content.width.max(1.0))
        .min(available.height / content.height.max(1.0))
        .min(1.0);
    let size = Size::new(content.width * factor, content.height * factor);
    let origin = (
        (page.width - size.width) / 2.0,
        (page.height - size.height) / 2.0,
    );
    Rect::from_origin_size(origin, size)
}

/// Render `scene` as a one-page A4 PDF.
pub fn render_print_bundle(scene: &Scene, options: &PrintOptions) -> ExportResult<Vec<u8>> {
    let content = export_bounds(scene, &options.svg).size();
    let png = render_png(
        scene,
        &RasterOptions {
            scale: options.scale,
            svg: options.svg.clone(),
        },
    )?;

    let page = page_size(options.orientation, content);
    let placed = fit_on_page(content, page);
    let page_svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="{pw}" height="{ph}" viewBox="0 0 {pw} {ph}">"#,
            r##"<rect width="{pw}" height="{ph}" fill="#ffffff"/>"##,
            r#"<image x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="xMidYMid meet" "#,
            r#"xlink:href="data:image/png;base64,{data}"/></svg>"#,
        ),
        pw = page.width,
        ph = page.height,
        x = placed.x0,
        y = placed.y0,
        w = placed.width(),
        h = placed.height(),
        data = STANDARD.encode(&png),
    );
    svg_to_pdf(&page_svg)
}

fn svg_to_pdf(svg: &str) -> ExportResult<Vec<u8>> {
    let opt = svg2pdf::usvg::Options::default();
    let tree =
        svg2pdf::usvg::Tree::from_str(svg, &opt).map_err(|e| ExportError::Svg(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| ExportError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{SceneObject, ShapeType};
    use kurbo::Point;

    #[test]
    fn test_page_orientation() {
        let wide = Size::new(800.0, 300.0);
        assert_eq!(page_size(PageOrientation::Auto, wide), Size::new(841.89, 595.28));
        assert_eq!(page_size(PageOrientation::Portrait, wide), A4_SIZE);
        assert_eq!(
            page_size(PageOrientation::Auto, Size::new(300.0, 800.0)),
            A4_SIZE
        );
    }

    #[test]
    fn test_fit_never_enlarges() {
        let placed = fit_on_page(Size::new(100.0, 50.0), A4_SIZE);
        assert!((placed.width() - 100.0).abs() < 1e-9);
        assert!((placed.center().x - A4_SIZE.width / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_shrinks_to_margins() {
        let placed = fit_on_page(Size::new(4000.0, 1000.0), A4_SIZE);
        let available = A4_SIZE.width - 2.0 * PAGE_MARGIN;
        assert!((placed.width() - available).abs() < 1e-9);
        assert!((placed.height() - available / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_print_bundle_is_pdf() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::with_defaults(
            ShapeType::Hexagon,
            Point::new(0.0, 0.0),
        ));
        let pdf = render_print_bundle(&scene, &PrintOptions::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }
}
