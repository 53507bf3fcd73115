//! Typed shape creation with default geometry and auto-placement.

use super::{SceneObject, ShapeType};
use kurbo::{Point, Rect, Size, Vec2};

/// Default distance between auto-placement cells.
pub const DEFAULT_PLACEMENT_SPACING: f64 = 220.0;
/// Default clearance required around an auto-placed shape.
pub const DEFAULT_PLACEMENT_MARGIN: f64 = 40.0;
/// Offset of the first auto-placement cell from the visible area's corner.
const START_OFFSET: f64 = 80.0;
/// Rows scanned before falling back.
const SCAN_ROWS: usize = 10;

/// Where a new shape should go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Top-left corner at the given world point.
    At(Point),
    /// First free cell inside the visible area.
    Auto,
}

/// What auto-placement needs to know about the current scene.
#[derive(Debug, Clone, Default)]
pub struct PlacementArea {
    /// Visible world rectangle.
    pub visible: Rect,
    /// Bounds of existing objects (frames excluded).
    pub occupied: Vec<Rect>,
    /// Bounds of the most recently created object, if any.
    pub last_created: Option<Rect>,
}

/// Builds scene objects with per-kind defaults.
#[derive(Debug, Clone, Copy)]
pub struct ShapeFactory {
    spacing: f64,
    margin: f64,
}

impl Default for ShapeFactory {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEMENT_SPACING, DEFAULT_PLACEMENT_MARGIN)
    }
}

impl ShapeFactory {
    pub fn new(spacing: f64, margin: f64) -> Self {
        Self {
            spacing: if spacing > 0.0 { spacing } else { DEFAULT_PLACEMENT_SPACING },
            margin: margin.max(0.0),
        }
    }

    /// Create a shape of `shape_type` at the requested placement.
    pub fn create(
        &self,
        shape_type: ShapeType,
        placement: Placement,
        area: &PlacementArea,
    ) -> SceneObject {
        let size = shape_type.defaults().size;
        let position = match placement {
            Placement::At(point) => point,
            Placement::Auto => self.auto_position(size, area),
        };
        SceneObject::with_defaults(shape_type, position)
    }

    /// Find a top-left position for a shape of `size`.
    ///
    /// Scans cells row-major from the visible area's corner and takes the
    /// first one whose padded box overlaps nothing. Falls back to the right
    /// of the last-created object.
    pub fn auto_position(&self, size: Size, area: &PlacementArea) -> Point {
        let start = area.visible.origin() + Vec2::new(START_OFFSET, START_OFFSET);
        let columns = (((area.visible.width() - START_OFFSET) / self.spacing).floor() as usize).max(1);

        for row in 0..SCAN_ROWS {
            for column in 0..columns {
                let candidate = start + Vec2::new(column as f64, row as f64) * self.spacing;
                let padded = Rect::from_origin_size(candidate, size).inflate(self.margin, self.margin);
                if !area.occupied.iter().any(|r| overlaps(padded, *r)) {
                    return candidate;
                }
            }
        }

        match area.last_created {
            Some(last) => Point::new(last.x1 + self.margin, last.y0),
            None => start,
        }
    }
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(occupied: Vec<Rect>) -> PlacementArea {
        PlacementArea {
            visible: Rect::new(0.0, 0.0, 1280.0, 800.0),
            occupied,
            last_created: None,
        }
    }

    #[test]
    fn test_explicit_placement() {
        let factory = ShapeFactory::default();
        let object = factory.create(ShapeType::Ellipse, Placement::At(Point::new(5.0, 6.0)), &area(vec![]));
        assert_eq!(object.geometry.position, Point::new(5.0, 6.0));
        assert_eq!(object.geometry.size, Size::new(140.0, 100.0));
    }

    #[test]
    fn test_auto_placement_uses_first_cell_on_empty_canvas() {
        let factory = ShapeFactory::default();
        let object = factory.create(ShapeType::Rectangle, Placement::Auto, &area(vec![]));
        assert_eq!(object.geometry.position, Point::new(80.0, 80.0));
    }

    #[test]
    fn test_auto_placement_skips_occupied_cell() {
        let factory = ShapeFactory::default();
        let taken = Rect::new(80.0, 80.0, 240.0, 180.0);
        let position = factory.auto_position(Size::new(160.0, 100.0), &area(vec![taken]));
        assert_eq!(position, Point::new(300.0, 80.0));
    }

    #[test]
    fn test_auto_placement_respects_margin() {
        let factory = ShapeFactory::default();
        // Within 40 of the second cell's left edge.
        let near = Rect::new(0.0, 0.0, 270.0, 100.0);
        let position = factory.auto_position(Size::new(160.0, 100.0), &area(vec![near]));
        assert_eq!(position, Point::new(520.0, 80.0));
    }

    #[test]
    fn test_auto_placement_falls_back_beside_last_created() {
        let factory = ShapeFactory::default();
        let everything = Rect::new(-10_000.0, -10_000.0, 10_000.0, 10_000.0);
        let mut area = area(vec![everything]);
        area.last_created = Some(Rect::new(100.0, 50.0, 260.0, 150.0));
        let position = factory.auto_position(Size::new(160.0, 100.0), &area);
        assert_eq!(position, Point::new(300.0, 50.0));
    }

    #[test]
    fn test_narrow_viewport_has_one_column() {
        let factory = ShapeFactory::default();
        let area = PlacementArea {
            visible: Rect::new(0.0, 0.0, 100.0, 2000.0),
            occupied: vec![Rect::new(80.0, 80.0, 240.0, 180.0)],
            last_created: None,
        };
        let position = factory.auto_position(Size::new(160.0, 100.0), &area);
        assert_eq!(position, Point::new(80.0, 300.0));
    }
}
