//! SVG rendering of a scene.
//!
//! Draw order is frames, then connections, then objects back to front.

use crate::error::RenderError;
use inkboard_core::connection::Connection;
use inkboard_core::frame::Frame;
use inkboard_core::shapes::{SceneObject, SerializableColor, ShapeKind, ShapeStyle, union_bounds};
use inkboard_core::Scene;
use kurbo::{Point, Rect, Vec2};
use std::f64::consts::PI;
use std::fmt::Write;

/// Padding around the content, in world units.
pub const DEFAULT_EXPORT_PADDING: f64 = 20.0;

const FRAME_STROKE: SerializableColor = SerializableColor::new(148, 163, 184, 255);
const FRAME_FILL: SerializableColor = SerializableColor::new(248, 250, 252, 255);
const CONNECTION_STROKE: SerializableColor = SerializableColor::new(71, 85, 105, 255);
const CONNECTION_WIDTH: f64 = 2.0;
const LABEL_FONT_SIZE: f64 = 16.0;
const FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

/// Options for [`render_svg`].
#[derive(Debug, Clone)]
pub struct SvgOptions {
    pub padding: f64,
    /// Page background; `None` leaves it transparent.
    pub background: Option<SerializableColor>,
    pub include_frames: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_EXPORT_PADDING,
            background: Some(SerializableColor::white()),
            include_frames: true,
        }
    }
}

/// Area covered by the export: drawable content plus padding.
///
/// An empty scene yields a padded rectangle around the origin.
pub fn export_bounds(scene: &Scene, options: &SvgOptions) -> Rect {
    let objects = scene
        .objects()
        .filter(|o| o.geometry.is_finite())
        .map(SceneObject::bounds);
    let frames = scene
        .frames()
        .filter(|f| options.include_frames && f.geometry.is_finite())
        .map(Frame::bounds);
    let padding = options.padding.max(0.0);
    union_bounds(objects.chain(frames))
        .unwrap_or(Rect::ZERO)
        .inflate(padding, padding)
}

/// Render `scene` as a standalone SVG document.
///
/// Objects that cannot be drawn are logged and left out.
pub fn render_svg(scene: &Scene, options: &SvgOptions) -> String {
    let bounds = export_bounds(scene, options);
    let width = bounds.width().max(1.0);
    let height = bounds.height().max(1.0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}">"#,
        x = num(bounds.x0),
        y = num(bounds.y0),
        w = num(width),
        h = num(height),
    );
    if let Some(background) = options.background {
        let _ = writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
            num(bounds.x0),
            num(bounds.y0),
            num(width),
            num(height),
            fill_attrs(Some(background)),
        );
    }

    if options.include_frames {
        for frame in scene.frames() {
            write_frame(&mut out, frame);
        }
    }
    for connection in scene.connections() {
        write_connection(&mut out, connection);
    }
    for object in scene.objects() {
        if let Err(e) = write_object(&mut out, object) {
            log::warn!("skipping object in export: {}", e);
        }
    }
    out.push_str("</svg>\n");
    out
}

fn write_frame(out: &mut String, frame: &Frame) {
    if !frame.geometry.is_finite() {
        log::warn!("skipping frame {} with non-finite geometry", frame.id());
        return;
    }
    let rect = frame.bounds();
    let _ = writeln!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="8" {} stroke="{}" stroke-width="1.5" stroke-dasharray="8 6"/>"#,
        num(rect.x0),
        num(rect.y0),
        num(rect.width()),
        num(rect.height()),
        fill_attrs(Some(FRAME_FILL)),
        FRAME_STROKE.to_rgb_hex(),
    );
    if !frame.label.is_empty() {
        write_text(
            out,
            Point::new(rect.x0 + 8.0, rect.y0 - 8.0),
            &frame.label,
            LABEL_FONT_SIZE * 0.875,
            FRAME_STROKE,
            "start",
        );
    }
}

fn write_connection(out: &mut String, connection: &Connection) {
    let path = &connection.cached_path;
    if !is_finite(path.start) || !is_finite(path.end) {
        log::warn!("skipping connection {} with non-finite path", connection.id());
        return;
    }
    let _ = writeln!(
        out,
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
        num(path.start.x),
        num(path.start.y),
        num(path.end.x),
        num(path.end.y),
        CONNECTION_STROKE.to_rgb_hex(),
        num(CONNECTION_WIDTH),
    );
    for head in &path.arrowheads {
        write_polygon(out, &head.triangle(), &fill_attrs(Some(CONNECTION_STROKE)));
    }
}

fn write_object(out: &mut String, object: &SceneObject) -> Result<(), RenderError> {
    let points = object.path_points();
    if !object.geometry.is_finite() || !points.iter().all(|p| is_finite(*p)) {
        return Err(RenderError::NonFinite(object.id()));
    }

    let style = &object.style;
    let rect = object.geometry.rect();
    let center = rect.center();
    let mut group = format!(r#"<g opacity="{}""#, num(style.opacity.clamp(0.0, 1.0)));
    if object.geometry.rotation != 0.0 {
        let _ = write!(
            group,
            r#" transform="rotate({} {} {})""#,
            num(object.geometry.rotation.to_degrees()),
            num(center.x),
            num(center.y),
        );
    }
    out.push_str(&group);
    out.push_str(">\n");

    let paint = format!("{} {}", fill_attrs(style.fill), stroke_attrs(style));
    match &object.kind {
        ShapeKind::Rectangle { corner_radius } => {
            let _ = writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" {}/>"#,
                num(rect.x0),
                num(rect.y0),
                num(rect.width()),
                num(rect.height()),
                num(corner_radius.max(0.0)),
                paint,
            );
        }
        ShapeKind::Ellipse => {
            let _ = writeln!(
                out,
                r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" {}/>"#,
                num(center.x),
                num(center.y),
                num(rect.width() / 2.0),
                num(rect.height() / 2.0),
                paint,
            );
        }
        ShapeKind::Diamond
        | ShapeKind::Triangle
        | ShapeKind::Pentagon
        | ShapeKind::Hexagon
        | ShapeKind::Star { .. } => {
            if let Some(vertices) = object.kind.polygon(rect) {
                write_polygon(out, &vertices, &paint);
            }
        }
        ShapeKind::Line => write_polyline(out, &points, style),
        ShapeKind::Arrow { head_size } => {
            write_polyline(out, &points, style);
            if let [start, end] = points.as_slice() {
                let head = arrow_head(*start, *end, *head_size);
                write_polygon(out, &head, &fill_attrs(Some(style.stroke)));
            }
        }
        ShapeKind::Text { font_size } => {
            write_text(out, center, &object.label, *font_size, style.stroke, "middle");
        }
        ShapeKind::Sticky => {
            let _ = writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="4" {}/>"#,
                num(rect.x0),
                num(rect.y0),
                num(rect.width()),
                num(rect.height()),
                paint,
            );
        }
        ShapeKind::Stroke { .. } => write_polyline(out, &points, style),
    }

    let labelled = !matches!(object.kind, ShapeKind::Text { .. }) && !object.kind.is_open_path();
    if labelled && !object.label.is_empty() {
        write_text(out, center, &object.label, LABEL_FONT_SIZE, style.stroke, "middle");
    }
    out.push_str("</g>\n");
    Ok(())
}

fn arrow_head(start: Point, end: Point, size: f64) -> [Point; 3] {
    let angle = (end - start).atan2();
    let back = angle + PI;
    let wing = |offset: f64| {
        let a = back + offset;
        end + Vec2::new(a.cos(), a.sin()) * size
    };
    [end, wing(PI / 7.0), wing(-PI / 7.0)]
}

fn write_polygon(out: &mut String, points: &[Point], paint: &str) {
    let _ = writeln!(out, r#"<polygon points="{}" {}/>"#, point_list(points), paint);
}

fn write_polyline(out: &mut String, points: &[Point], style: &ShapeStyle) {
    if points.len() < 2 {
        return;
    }
    let _ = writeln!(
        out,
        r#"<polyline points="{}" fill="none" {} stroke-linecap="round" stroke-linejoin="round"/>"#,
        point_list(points),
        stroke_attrs(style),
    );
}

fn write_text(
    out: &mut String,
    at: Point,
    text: &str,
    font_size: f64,
    color: SerializableColor,
    anchor: &str,
) {
    let _ = writeln!(
        out,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" text-anchor="{}" dominant-baseline="central" {}>{}</text>"#,
        num(at.x),
        num(at.y),
        FONT_FAMILY,
        num(font_size),
        anchor,
        fill_attrs(Some(color)),
        escape_xml(text),
    );
}

fn fill_attrs(fill: Option<SerializableColor>) -> String {
    match fill {
        Some(color) if color.a == 255 => format!(r#"fill="{}""#, color.to_rgb_hex()),
        Some(color) => format!(
            r#"fill="{}" fill-opacity="{}""#,
            color.to_rgb_hex(),
            num(color.alpha())
        ),
        None => r#"fill="none""#.to_string(),
    }
}

fn stroke_attrs(style: &ShapeStyle) -> String {
    let mut attrs = format!(
        r#"stroke="{}" stroke-width="{}""#,
        style.stroke.to_rgb_hex(),
        num(style.stroke_width.max(0.0))
    );
    if style.stroke.a != 255 {
        let _ = write!(attrs, r#" stroke-opacity="{}""#, num(style.stroke.alpha()));
    }
    attrs
}

fn point_list(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_finite(point: Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Format a coordinate with at most two decimals.
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
