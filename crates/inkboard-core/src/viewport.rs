//! Viewport controller for pan, zoom and grid state.

use crate::snap::{GridLines, SnapResult, grid_lines, snap_to_grid};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest zoom level, in percent.
pub const MIN_ZOOM_PERCENT: f64 = 10.0;
/// Largest zoom level, in percent.
pub const MAX_ZOOM_PERCENT: f64 = 500.0;
/// Zoom level that maps one world unit to one screen pixel.
pub const DEFAULT_ZOOM_PERCENT: f64 = 100.0;
/// Multiplicative step used by zoom in/out.
pub const ZOOM_STEP: f64 = 1.25;
/// Default grid spacing in world units.
pub const DEFAULT_GRID_SPACING: f64 = 20.0;

fn default_grid_visible() -> bool {
    true
}

fn default_grid_spacing() -> f64 {
    DEFAULT_GRID_SPACING
}

fn default_screen_size() -> Size {
    Size::new(1280.0, 800.0)
}

/// Viewport manages the view transform for one open canvas.
///
/// Zoom is kept in percent and always clamped to
/// [`MIN_ZOOM_PERCENT`, `MAX_ZOOM_PERCENT`]. The pan offset is in screen
/// pixels: `screen = world * scale + pan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    #[serde(rename = "zoom")]
    zoom_percent: f64,
    #[serde(rename = "pan")]
    pan_offset: Vec2,
    #[serde(default = "default_grid_visible")]
    grid_visible: bool,
    #[serde(default = "default_grid_spacing")]
    grid_spacing: f64,
    #[serde(default)]
    snap_enabled: bool,
    /// Size of the drawing surface; runtime only.
    #[serde(skip, default = "default_screen_size")]
    screen_size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom_percent: DEFAULT_ZOOM_PERCENT,
            pan_offset: Vec2::ZERO,
            grid_visible: true,
            grid_spacing: DEFAULT_GRID_SPACING,
            snap_enabled: false,
            screen_size: default_screen_size(),
        }
    }
}

impl Viewport {
    /// Create a viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with a custom grid spacing.
    pub fn with_grid_spacing(grid_spacing: f64) -> Self {
        let mut viewport = Self::default();
        viewport.set_grid_spacing(grid_spacing);
        viewport
    }

    pub fn zoom_percent(&self) -> f64 {
        self.zoom_percent
    }

    /// World-to-screen scale factor (1.0 at 100%).
    pub fn scale(&self) -> f64 {
        self.zoom_percent / 100.0
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan_offset
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn grid_spacing(&self) -> f64 {
        self.grid_spacing
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn screen_size(&self) -> Size {
        self.screen_size
    }

    /// Set the zoom level, clamped to the allowed range.
    /// Returns true if the zoom level changed.
    pub fn set_zoom(&mut self, percent: f64) -> bool {
        if !percent.is_finite() {
            return false;
        }
        let clamped = percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
        if (clamped - self.zoom_percent).abs() < f64::EPSILON {
            return false;
        }
        self.zoom_percent = clamped;
        true
    }

    /// Zoom in one step around the center of the screen.
    pub fn zoom_in(&mut self) -> bool {
        let center = self.screen_center();
        self.zoom_at(center, ZOOM_STEP)
    }

    /// Zoom out one step around the center of the screen.
    pub fn zoom_out(&mut self) -> bool {
        let center = self.screen_center();
        self.zoom_at(center, 1.0 / ZOOM_STEP)
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) -> bool {
        let world_point = self.screen_to_world(screen_point);
        if !self.set_zoom(self.zoom_percent * factor) {
            return false;
        }

        // Adjust offset so world_point stays under screen_point
        let new_screen = self.world_to_screen(world_point);
        self.pan_offset += Vec2::new(
            screen_point.x - new_screen.x,
            screen_point.y - new_screen.y,
        );
        true
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.x.is_finite() && delta.y.is_finite() {
            self.pan_offset += delta;
        }
    }

    pub fn set_pan(&mut self, offset: Vec2) {
        if offset.x.is_finite() && offset.y.is_finite() {
            self.pan_offset = offset;
        }
    }

    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_size = Size::new(width.max(1.0), height.max(1.0));
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.grid_visible = visible;
    }

    pub fn toggle_grid(&mut self) {
        self.grid_visible = !self.grid_visible;
    }

    /// Set the grid spacing; non-positive values are ignored.
    pub fn set_grid_spacing(&mut self, spacing: f64) {
        if spacing.is_finite() && spacing > 0.0 {
            self.grid_spacing = spacing;
        }
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan_offset) * Affine::scale(self.scale())
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.pan_offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// The part of the world currently visible on screen.
    pub fn visible_world_rect(&self) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(
            self.screen_size.width,
            self.screen_size.height,
        ));
        Rect::from_points(top_left, bottom_right)
    }

    /// Snap a world point to the grid when snapping is enabled.
    pub fn snap(&self, point: Point) -> SnapResult {
        if self.snap_enabled {
            snap_to_grid(point, self.grid_spacing)
        } else {
            SnapResult::none(point)
        }
    }

    /// Grid lines covering the visible area, or `None` when the grid is hidden.
    pub fn grid(&self) -> Option<GridLines> {
        if !self.grid_visible {
            return None;
        }
        Some(grid_lines(
            self.visible_world_rect(),
            self.grid_spacing,
            self.scale(),
        ))
    }

    /// Reset zoom and pan, keeping grid settings.
    pub fn reset(&mut self) {
        self.zoom_percent = DEFAULT_ZOOM_PERCENT;
        self.pan_offset = Vec2::ZERO;
    }

    /// Fit the viewport to show the given world bounds.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let available = Size::new(
            (self.screen_size.width - padding * 2.0).max(1.0),
            (self.screen_size.height - padding * 2.0).max(1.0),
        );
        let scale = (available.width / bounds.width()).min(available.height / bounds.height());
        self.zoom_percent = (scale * 100.0).clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);

        let scale = self.scale();
        let center = bounds.center();
        self.pan_offset = Vec2::new(
            self.screen_size.width / 2.0 - center.x * scale,
            self.screen_size.height / 2.0 - center.y * scale,
        );
    }

    fn screen_center(&self) -> Point {
        Point::new(self.screen_size.width / 2.0, self.screen_size.height / 2.0)
    }
}
