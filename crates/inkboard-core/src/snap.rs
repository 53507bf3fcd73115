//! Grid generation and snapping.

use kurbo::{Point, Rect};

/// Grid lines closer than this on screen are thinned out.
pub const MIN_GRID_SCREEN_SPACING: f64 = 8.0;

/// Upper bound on generated lines per axis.
const MAX_LINES_PER_AXIS: usize = 1000;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return SnapResult::none(point);
    }
    SnapResult {
        point: Point::new(
            (point.x / grid_size).round() * grid_size,
            (point.y / grid_size).round() * grid_size,
        ),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Grid line positions in world coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLines {
    /// Effective spacing after thinning.
    pub spacing: f64,
    /// X positions of vertical lines.
    pub vertical: Vec<f64>,
    /// Y positions of horizontal lines.
    pub horizontal: Vec<f64>,
}

/// Generate grid lines covering `visible`.
///
/// When the grid would be denser than [`MIN_GRID_SCREEN_SPACING`] pixels at
/// the given scale, the spacing is doubled until it is not.
pub fn grid_lines(visible: Rect, spacing: f64, scale: f64) -> GridLines {
    if spacing <= 0.0 || !spacing.is_finite() || scale <= 0.0 {
        return GridLines::default();
    }

    let mut spacing = spacing;
    while spacing * scale < MIN_GRID_SCREEN_SPACING {
        spacing *= 2.0;
    }

    GridLines {
        spacing,
        vertical: axis_lines(visible.x0, visible.x1, spacing),
        horizontal: axis_lines(visible.y0, visible.y1, spacing),
    }
}

fn axis_lines(from: f64, to: f64, spacing: f64) -> Vec<f64> {
    let first = (from / spacing).ceil() as i64;
    let last = (to / spacing).floor() as i64;
    (first..=last)
        .take(MAX_LINES_PER_AXIS)
        .map(|i| i as f64 * spacing)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        let result = snap_to_grid(Point::new(27.0, 12.0), 20.0);
        assert!((result.point.x - 20.0).abs() < f64::EPSILON);
        assert!((result.point.y - 20.0).abs() < f64::EPSILON);
        assert!(result.is_snapped());
    }

    #[test]
    fn test_snap_invalid_grid() {
        let result = snap_to_grid(Point::new(27.0, 12.0), 0.0);
        assert!(!result.is_snapped());
    }

    #[test]
    fn test_grid_lines_cover_rect() {
        let lines = grid_lines(Rect::new(-10.0, 0.0, 45.0, 20.0), 20.0, 1.0);
        assert_eq!(lines.vertical, vec![0.0, 20.0, 40.0]);
        assert_eq!(lines.horizontal, vec![0.0, 20.0]);
    }

    #[test]
    fn test_grid_thins_when_zoomed_out() {
        // 20 units at 10% is 2px on screen; doubled to 80 units (8px).
        let lines = grid_lines(Rect::new(0.0, 0.0, 800.0, 800.0), 20.0, 0.1);
        assert!((lines.spacing - 80.0).abs() < f64::EPSILON);
        assert_eq!(lines.vertical.len(), 11);
    }
}
