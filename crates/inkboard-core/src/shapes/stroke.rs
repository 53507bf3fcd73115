//! Free-draw and highlighter stroke accumulation.

use super::{Geometry, SceneObject, ShapeKind, ShapeStyle, union_bounds};
use kurbo::{Point, Rect, Size};

/// Points closer than this to the previous point are dropped while drawing.
const MIN_POINT_DISTANCE: f64 = 1.0;
/// Tolerance used when simplifying a finished stroke.
const SIMPLIFY_TOLERANCE: f64 = 0.75;
/// Minimum stroke width for highlighter strokes.
pub const HIGHLIGHT_MIN_WIDTH: f64 = 12.0;
/// Opacity applied to highlighter strokes.
pub const HIGHLIGHT_OPACITY: f64 = 0.5;

/// Accumulates pointer positions for an in-progress stroke.
#[derive(Debug, Clone, Default)]
pub struct StrokeBuilder {
    points: Vec<Point>,
    highlight: bool,
}

impl StrokeBuilder {
    pub fn new(start: Point, highlight: bool) -> Self {
        Self {
            points: vec![start],
            highlight,
        }
    }

    pub fn is_highlight(&self) -> bool {
        self.highlight
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Add a point, skipping jitter below [`MIN_POINT_DISTANCE`].
    pub fn add_point(&mut self, point: Point) {
        if let Some(last) = self.points.last() {
            if (point - *last).hypot() < MIN_POINT_DISTANCE {
                return;
            }
        }
        self.points.push(point);
    }

    /// Turn the accumulated points into a stroke object.
    ///
    /// Returns `None` for a stroke with fewer than two distinct points.
    pub fn finish(self, base: &ShapeStyle) -> Option<SceneObject> {
        if self.points.len() < 2 {
            return None;
        }
        let points = simplify_points(&self.points, SIMPLIFY_TOLERANCE);
        let bounds = union_bounds(points.iter().map(|&p| Rect::from_points(p, p)))?;
        let origin = bounds.origin();
        let relative = points.iter().map(|p| Point::new(p.x - origin.x, p.y - origin.y)).collect();

        let style = if self.highlight {
            ShapeStyle {
                fill: None,
                stroke: base.stroke,
                stroke_width: base.stroke_width.max(HIGHLIGHT_MIN_WIDTH),
                opacity: HIGHLIGHT_OPACITY,
            }
        } else {
            ShapeStyle {
                fill: None,
                ..base.clone()
            }
        };

        Some(SceneObject::new(
            ShapeKind::Stroke {
                points: relative,
                highlight: self.highlight,
            },
            Geometry::new(origin, Size::new(bounds.width(), bounds.height())),
            style,
        ))
    }
}

/// Ramer-Douglas-Peucker line simplification.
pub fn simplify_points(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let (max_index, max_dist) = points
        .iter()
        .enumerate()
        .skip(1)
        .take(points.len() - 2)
        .map(|(i, p)| (i, perpendicular_distance(*p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > tolerance {
        let mut left = simplify_points(&points[..=max_index], tolerance);
        let right = simplify_points(&points[max_index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let line = line_end - line_start;
    let len = line.hypot();
    if len < f64::EPSILON {
        return (point - line_start).hypot();
    }
    (point - line_start).cross(line).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_drops_collinear_points() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.1),
            Point::new(4.0, 0.0),
        ];
        let simplified = simplify_points(&points, 0.5);
        assert_eq!(simplified, vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 0.0),
        ];
        assert_eq!(simplify_points(&points, 0.5).len(), 3);
    }

    #[test]
    fn test_single_point_stroke_is_discarded() {
        let mut builder = StrokeBuilder::new(Point::new(10.0, 10.0), false);
        builder.add_point(Point::new(10.2, 10.1));
        assert!(builder.finish(&ShapeStyle::default()).is_none());
    }

    #[test]
    fn test_finish_makes_points_relative() {
        let mut builder = StrokeBuilder::new(Point::new(10.0, 20.0), false);
        builder.add_point(Point::new(30.0, 25.0));
        builder.add_point(Point::new(50.0, 60.0));
        let stroke = builder.finish(&ShapeStyle::default()).unwrap();
        assert_eq!(stroke.geometry.position, Point::new(10.0, 20.0));
        match &stroke.kind {
            ShapeKind::Stroke { points, highlight } => {
                assert!(!highlight);
                assert_eq!(points[0], Point::ZERO);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(stroke.path_points()[0], Point::new(10.0, 20.0));
    }

    #[test]
    fn test_highlight_is_wide_and_translucent() {
        let mut builder = StrokeBuilder::new(Point::ZERO, true);
        builder.add_point(Point::new(40.0, 0.0));
        let stroke = builder.finish(&ShapeStyle::default()).unwrap();
        assert!((stroke.style.stroke_width - HIGHLIGHT_MIN_WIDTH).abs() < f64::EPSILON);
        assert!((stroke.style.opacity - HIGHLIGHT_OPACITY).abs() < f64::EPSILON);
    }
}
