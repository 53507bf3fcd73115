//! Scene objects: placed shapes, text, sticky notes and strokes.

mod factory;
mod kind;
mod stroke;
mod style;

pub use factory::{
    DEFAULT_PLACEMENT_MARGIN, DEFAULT_PLACEMENT_SPACING, Placement, PlacementArea, ShapeFactory,
};
pub use kind::{ShapeDefaults, ShapeKind, ShapeType};
pub use stroke::{HIGHLIGHT_MIN_WIDTH, HIGHLIGHT_OPACITY, StrokeBuilder, simplify_points};
pub use style::{SerializableColor, ShapeStyle};

use crate::connection::ConnectionId;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for scene objects.
pub type ObjectId = Uuid;

/// Position, size and rotation of an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Top-left corner (start point for lines and arrows).
    pub position: Point,
    /// Extent from `position`. May be negative for lines and arrows.
    pub size: Size,
    /// Rotation in radians around the center.
    #[serde(default)]
    pub rotation: f64,
}

impl Geometry {
    pub fn new(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
        }
    }

    /// The unrotated rectangle spanned by position and size.
    pub fn rect(&self) -> Rect {
        Rect::from_points(
            self.position,
            self.position + Vec2::new(self.size.width, self.size.height),
        )
    }

    /// Axis-aligned bounds, accounting for rotation.
    pub fn bounds(&self) -> Rect {
        let rect = self.rect();
        if self.rotation == 0.0 {
            return rect;
        }
        let center = rect.center();
        let rotate = Affine::rotate_about(self.rotation, center);
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        corners
            .iter()
            .map(|&p| rotate * p)
            .fold(Rect::from_points(rotate * corners[0], rotate * corners[0]), |acc, p| {
                acc.union_pt(p)
            })
    }

    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite()
            && self.position.y.is_finite()
            && self.size.width.is_finite()
            && self.size.height.is_finite()
            && self.rotation.is_finite()
    }
}

/// Bookkeeping attached to every object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    /// Stable node identifier exposed to external collaborators.
    pub node_id: String,
    /// Connections that reference this object, in creation order.
    #[serde(default)]
    pub connection_ids: Vec<ConnectionId>,
}

/// A placed object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub(crate) id: ObjectId,
    pub kind: ShapeKind,
    pub geometry: Geometry,
    pub style: ShapeStyle,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub metadata: ObjectMetadata,
}

impl SceneObject {
    /// Create an object with a fresh id.
    pub fn new(kind: ShapeKind, geometry: Geometry, style: ShapeStyle) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            kind,
            geometry,
            style,
            label: String::new(),
            metadata: ObjectMetadata {
                node_id: id.to_string(),
                connection_ids: Vec::new(),
            },
        }
    }

    /// Create an object of the given type with its default size and style.
    pub fn with_defaults(shape_type: ShapeType, position: Point) -> Self {
        let defaults = shape_type.defaults();
        let mut object = Self::new(
            defaults.kind,
            Geometry::new(position, defaults.size),
            defaults.style,
        );
        object.label = defaults.label.to_string();
        object
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// Axis-aligned bounding box in world coordinates.
    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Points of an open path (line, arrow, stroke) in world coordinates.
    pub fn path_points(&self) -> Vec<Point> {
        let origin = self.geometry.position;
        match &self.kind {
            ShapeKind::Line | ShapeKind::Arrow { .. } => vec![
                origin,
                origin + Vec2::new(self.geometry.size.width, self.geometry.size.height),
            ],
            ShapeKind::Stroke { points, .. } => {
                points.iter().map(|p| origin + p.to_vec2()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.geometry.position += delta;
    }

    /// Resize to `size`. Area shapes ignore non-positive sizes; strokes scale
    /// their points proportionally.
    pub fn resize(&mut self, size: Size) -> bool {
        if !size.width.is_finite() || !size.height.is_finite() {
            return false;
        }
        match &mut self.kind {
            ShapeKind::Line | ShapeKind::Arrow { .. } => {}
            ShapeKind::Stroke { points, .. } => {
                if size.width < 0.0 || size.height < 0.0 {
                    return false;
                }
                let old = self.geometry.size;
                let sx = if old.width > 0.0 { size.width / old.width } else { 1.0 };
                let sy = if old.height > 0.0 { size.height / old.height } else { 1.0 };
                for p in points.iter_mut() {
                    *p = Point::new(p.x * sx, p.y * sy);
                }
            }
            _ => {
                if size.width <= 0.0 || size.height <= 0.0 {
                    return false;
                }
            }
        }
        self.geometry.size = size;
        true
    }

    /// Check if a point (in world coordinates) hits this object.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.kind.is_open_path() {
            let reach = tolerance + self.style.stroke_width / 2.0;
            return point_to_polyline_dist(point, &self.path_points()) <= reach;
        }
        let rect = self.geometry.rect();
        // Test in the object's unrotated frame.
        let local = if self.geometry.rotation == 0.0 {
            point
        } else {
            Affine::rotate_about(-self.geometry.rotation, rect.center()) * point
        };
        match self.kind {
            ShapeKind::Ellipse => {
                let rx = rect.width() / 2.0 + tolerance;
                let ry = rect.height() / 2.0 + tolerance;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let c = rect.center();
                let dx = (local.x - c.x) / rx;
                let dy = (local.y - c.y) / ry;
                dx * dx + dy * dy <= 1.0
            }
            _ => rect.inflate(tolerance, tolerance).contains(local),
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Union of the bounds of all given rects, or `None` if empty.
pub fn union_bounds(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects
        .into_iter()
        .fold(None, |acc: Option<Rect>, r| Some(acc.map_or(r, |a| a.union(r))))
}
