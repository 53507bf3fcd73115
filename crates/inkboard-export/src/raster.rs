//! PNG export through resvg.

use crate::error::{ExportError, ExportResult};
use crate::svg::{SvgOptions, render_svg};
use inkboard_core::Scene;

/// Largest raster edge, in pixels.
pub const MAX_RASTER_EDGE: u32 = 16_384;

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Resolution multiplier (1 = 1x, 2 = 2x, 3 = 3x).
    pub scale: f32,
    pub svg: SvgOptions,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            svg: SvgOptions::default(),
        }
    }
}

/// Render `scene` to PNG bytes.
pub fn render_png(scene: &Scene, options: &RasterOptions) -> ExportResult<Vec<u8>> {
    let svg = render_svg(scene, &options.svg);
    svg_to_png(&svg, options.scale)
}

/// Rasterize an SVG document to PNG bytes.
pub fn svg_to_png(svg: &str, scale: f32) -> ExportResult<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, scale)?;
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    encode_png(&rgba, pixmap.width(), pixmap.height())
}

pub(crate) fn svg_to_pixmap(svg: &str, scale: f32) -> ExportResult<tiny_skia::Pixmap> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ExportError::Raster(format!("invalid scale {}", scale)));
    }
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| ExportError::Svg(e.to_string()))?;
    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0);
    let height = (size.height() * scale).ceil().max(1.0);
    if width > MAX_RASTER_EDGE as f32 || height > MAX_RASTER_EDGE as f32 {
        return Err(ExportError::Raster(format!(
            "image of {}x{} pixels exceeds the {} pixel limit",
            width, height, MAX_RASTER_EDGE
        )));
    }

    let mut pixmap = tiny_skia::Pixmap::new(width as u32, height as u32)
        .ok_or_else(|| ExportError::Raster("failed to allocate pixmap".to_string()))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

/// Encode RGBA pixel data to PNG bytes.
fn encode_png(rgba: &[u8], width: u32, height: u32) -> ExportResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| ExportError::Encode(format!("PNG data: {}", e)))?;
    }
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::SceneObject;
    use inkboard_core::ShapeType;
    use kurbo::Point;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn png_size(bytes: &[u8]) -> (u32, u32) {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        (info.width, info.height)
    }

    #[test]
    fn test_svg_to_png_signature() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="10" height="10" fill="black"/></svg>"#;
        let bytes = svg_to_png(svg, 1.0).unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));
        assert_eq!(png_size(&bytes), (10, 10));
    }

    #[test]
    fn test_scene_png_scales() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::with_defaults(
            ShapeType::Rectangle,
            Point::new(0.0, 0.0),
        ));
        let options = RasterOptions {
            scale: 2.0,
            ..RasterOptions::default()
        };
        let bytes = render_png(&scene, &options).unwrap();
        // 160x100 plus 20 padding on each side, doubled.
        assert_eq!(png_size(&bytes), (400, 280));
    }

    #[test]
    fn test_invalid_svg() {
        assert!(matches!(svg_to_png("<svg", 1.0), Err(ExportError::Svg(_))));
    }

    #[test]
    fn test_invalid_scale() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"/>"#;
        assert!(matches!(svg_to_png(svg, 0.0), Err(ExportError::Raster(_))));
    }
}
