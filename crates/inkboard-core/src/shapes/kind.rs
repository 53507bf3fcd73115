//! Closed set of shape kinds and their per-kind defaults.

use super::style::{SerializableColor, ShapeStyle};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Kind tag used to request a new shape (toolbar, shortcuts, drag-and-drop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeType {
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
    Pentagon,
    Hexagon,
    Star,
    Line,
    Arrow,
    Text,
    Sticky,
    Stroke,
}

impl ShapeType {
    /// All kinds a user can place from the palette.
    pub const PLACEABLE: [ShapeType; 11] = [
        ShapeType::Rectangle,
        ShapeType::Ellipse,
        ShapeType::Diamond,
        ShapeType::Triangle,
        ShapeType::Pentagon,
        ShapeType::Hexagon,
        ShapeType::Star,
        ShapeType::Line,
        ShapeType::Arrow,
        ShapeType::Text,
        ShapeType::Sticky,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Diamond => "diamond",
            ShapeType::Triangle => "triangle",
            ShapeType::Pentagon => "pentagon",
            ShapeType::Hexagon => "hexagon",
            ShapeType::Star => "star",
            ShapeType::Line => "line",
            ShapeType::Arrow => "arrow",
            ShapeType::Text => "text",
            ShapeType::Sticky => "sticky",
            ShapeType::Stroke => "stroke",
        }
    }

    /// Parse a kind name as written by [`ShapeType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        [ShapeType::Stroke]
            .into_iter()
            .chain(Self::PLACEABLE)
            .find(|t| t.name() == name)
    }

    /// Default geometry, kind data, style and label for a new shape.
    pub fn defaults(self) -> ShapeDefaults {
        let base = ShapeStyle::default();
        match self {
            ShapeType::Rectangle => ShapeDefaults {
                size: Size::new(160.0, 100.0),
                kind: ShapeKind::Rectangle { corner_radius: 8.0 },
                style: base.with_fill(SerializableColor::new(219, 234, 254, 255)),
                label: "Rectangle",
            },
            ShapeType::Ellipse => ShapeDefaults {
                size: Size::new(140.0, 100.0),
                kind: ShapeKind::Ellipse,
                style: base.with_fill(SerializableColor::new(220, 252, 231, 255)),
                label: "Ellipse",
            },
            ShapeType::Diamond => ShapeDefaults {
                size: Size::new(140.0, 140.0),
                kind: ShapeKind::Diamond,
                style: base.with_fill(SerializableColor::new(254, 243, 199, 255)),
                label: "Decision",
            },
            ShapeType::Triangle => ShapeDefaults {
                size: Size::new(140.0, 120.0),
                kind: ShapeKind::Triangle,
                style: base.with_fill(SerializableColor::new(252, 231, 243, 255)),
                label: "Triangle",
            },
            ShapeType::Pentagon => ShapeDefaults {
                size: Size::new(140.0, 134.0),
                kind: ShapeKind::Pentagon,
                style: base.with_fill(SerializableColor::new(237, 233, 254, 255)),
                label: "Pentagon",
            },
            ShapeType::Hexagon => ShapeDefaults {
                size: Size::new(150.0, 130.0),
                kind: ShapeKind::Hexagon,
                style: base.with_fill(SerializableColor::new(224, 242, 254, 255)),
                label: "Hexagon",
            },
            ShapeType::Star => ShapeDefaults {
                size: Size::new(140.0, 140.0),
                kind: ShapeKind::Star {
                    points: 5,
                    inner_ratio: 0.45,
                },
                style: base.with_fill(SerializableColor::new(254, 249, 195, 255)),
                label: "Star",
            },
            ShapeType::Line => ShapeDefaults {
                size: Size::new(160.0, 0.0),
                kind: ShapeKind::Line,
                style: base,
                label: "",
            },
            ShapeType::Arrow => ShapeDefaults {
                size: Size::new(160.0, 0.0),
                kind: ShapeKind::Arrow { head_size: 14.0 },
                style: base,
                label: "",
            },
            ShapeType::Text => ShapeDefaults {
                size: Size::new(200.0, 40.0),
                kind: ShapeKind::Text { font_size: 20.0 },
                style: ShapeStyle {
                    stroke_width: 0.0,
                    ..base
                },
                label: "Text",
            },
            ShapeType::Sticky => ShapeDefaults {
                size: Size::new(200.0, 200.0),
                kind: ShapeKind::Sticky,
                style: ShapeStyle::stroke_only(SerializableColor::new(202, 138, 4, 255), 1.0)
                    .with_fill(SerializableColor::new(254, 240, 138, 255)),
                label: "Note",
            },
            ShapeType::Stroke => ShapeDefaults {
                size: Size::ZERO,
                kind: ShapeKind::Stroke {
                    points: Vec::new(),
                    highlight: false,
                },
                style: base,
                label: "",
            },
        }
    }
}

/// Defaults produced by [`ShapeType::defaults`].
#[derive(Debug, Clone)]
pub struct ShapeDefaults {
    pub size: Size,
    pub kind: ShapeKind,
    pub style: ShapeStyle,
    pub label: &'static str,
}

/// Kind of a scene object, with the data specific to that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Rectangle { corner_radius: f64 },
    Ellipse,
    Diamond,
    Triangle,
    Pentagon,
    Hexagon,
    Star { points: u8, inner_ratio: f64 },
    /// Runs from the geometry position to position + size.
    Line,
    /// Runs from the geometry position to position + size, head at the end.
    Arrow { head_size: f64 },
    Text { font_size: f64 },
    Sticky,
    /// Free-form stroke; points are relative to the geometry position.
    Stroke { points: Vec<Point>, highlight: bool },
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Rectangle { .. } => ShapeType::Rectangle,
            ShapeKind::Ellipse => ShapeType::Ellipse,
            ShapeKind::Diamond => ShapeType::Diamond,
            ShapeKind::Triangle => ShapeType::Triangle,
            ShapeKind::Pentagon => ShapeType::Pentagon,
            ShapeKind::Hexagon => ShapeType::Hexagon,
            ShapeKind::Star { .. } => ShapeType::Star,
            ShapeKind::Line => ShapeType::Line,
            ShapeKind::Arrow { .. } => ShapeType::Arrow,
            ShapeKind::Text { .. } => ShapeType::Text,
            ShapeKind::Sticky => ShapeType::Sticky,
            ShapeKind::Stroke { .. } => ShapeType::Stroke,
        }
    }

    /// Lines, arrows and strokes are open paths; everything else is an area.
    pub fn is_open_path(&self) -> bool {
        matches!(
            self,
            ShapeKind::Line | ShapeKind::Arrow { .. } | ShapeKind::Stroke { .. }
        )
    }

    /// Outline vertices of polygonal kinds inside `rect`, or `None` for kinds
    /// that are not drawn as a polygon.
    pub fn polygon(&self, rect: Rect) -> Option<Vec<Point>> {
        let center = rect.center();
        let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
        match self {
            ShapeKind::Diamond => Some(vec![
                Point::new(center.x, rect.y0),
                Point::new(rect.x1, center.y),
                Point::new(center.x, rect.y1),
                Point::new(rect.x0, center.y),
            ]),
            ShapeKind::Triangle => Some(vec![
                Point::new(center.x, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ]),
            ShapeKind::Pentagon => Some(regular_polygon(center, rx, ry, 5, -FRAC_PI_2)),
            ShapeKind::Hexagon => Some(regular_polygon(center, rx, ry, 6, 0.0)),
            ShapeKind::Star {
                points,
                inner_ratio,
            } => {
                let points = (*points).max(3) as usize;
                let step = PI / points as f64;
                Some(
                    (0..points * 2)
                        .map(|i| {
                            let ratio = if i % 2 == 0 { 1.0 } else { *inner_ratio };
                            let angle = -FRAC_PI_2 + step * i as f64;
                            Point::new(
                                center.x + rx * ratio * angle.cos(),
                                center.y + ry * ratio * angle.sin(),
                            )
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }
}

fn regular_polygon(center: Point, rx: f64, ry: f64, sides: usize, start: f64) -> Vec<Point> {
    let step = 2.0 * PI / sides as f64;
    (0..sides)
        .map(|i| {
            let angle = start + step * i as f64;
            Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect()
}
