//! Background frames that group and auto-fit around objects.

use crate::scene::{Scene, contains_rect};
use crate::shapes::{Geometry, ObjectId, union_bounds};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for frames.
pub type FrameId = Uuid;

/// Space kept between a frame's contents and its edge.
pub const DEFAULT_FRAME_PADDING: f64 = 40.0;
/// Size of a newly created frame.
pub const DEFAULT_FRAME_SIZE: Size = Size::new(400.0, 300.0);

/// A container drawn behind all objects.
///
/// Frames are not hit by pointer input unless the frame tool is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub(crate) id: FrameId,
    pub geometry: Geometry,
    #[serde(default)]
    pub contained_object_ids: Vec<ObjectId>,
    #[serde(default = "default_auto_resize")]
    pub auto_resize: bool,
    #[serde(default)]
    pub label: String,
}

fn default_auto_resize() -> bool {
    true
}

impl Frame {
    pub fn new(position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry: Geometry::new(position, size),
            contained_object_ids: Vec::new(),
            auto_resize: true,
            label: "Frame".to_string(),
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }
}

impl Scene {
    /// Insert a frame at the back of the frame order.
    pub fn create_frame(&mut self, position: Point, size: Size) -> Option<FrameId> {
        let frame = Frame::new(position, size);
        if !frame.geometry.is_finite() || size.width <= 0.0 || size.height <= 0.0 {
            log::debug!("ignoring frame with invalid geometry {position:?} {size:?}");
            return None;
        }
        let id = frame.id;
        self.frames.shift_insert(0, id, frame);
        Some(id)
    }

    /// Insert an existing frame at the back. Used when restoring a scene.
    pub(crate) fn insert_frame(&mut self, frame: Frame) {
        self.frames.insert(frame.id, frame);
    }

    /// Delete a frame. Its contents are left untouched.
    pub fn remove_frame(&mut self, id: FrameId) -> Option<Frame> {
        let removed = self.frames.shift_remove(&id);
        if removed.is_none() {
            log::debug!("ignoring removal of unknown frame {id}");
        }
        removed
    }

    /// Translate a frame without moving its contents.
    pub fn move_frame(&mut self, id: FrameId, delta: Vec2) -> bool {
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            return false;
        }
        match self.frames.get_mut(&id) {
            Some(frame) => {
                frame.geometry.position += delta;
                true
            }
            None => false,
        }
    }

    pub fn set_frame_auto_resize(&mut self, id: FrameId, auto_resize: bool) -> bool {
        match self.frames.get_mut(&id) {
            Some(frame) => {
                frame.auto_resize = auto_resize;
                true
            }
            None => false,
        }
    }

    /// Refit a frame around the objects fully inside its current bounds.
    ///
    /// Returns false when no object qualifies. The frame keeps its geometry
    /// in that case and only drops stale members.
    pub fn recompute_auto_resize(&mut self, id: FrameId) -> bool {
        let Some(frame) = self.frames.get(&id) else {
            return false;
        };
        let bounds = frame.bounds();
        let contained: Vec<ObjectId> = self
            .objects()
            .filter(|o| contains_rect(bounds, o.bounds()))
            .map(|o| o.id())
            .collect();
        let Some(union) = union_bounds(
            contained
                .iter()
                .filter_map(|id| self.objects.get(id))
                .map(|o| o.bounds()),
        ) else {
            if let Some(frame) = self.frames.get_mut(&id) {
                frame.contained_object_ids.clear();
            }
            return false;
        };

        let fitted = union.inflate(self.frame_padding, self.frame_padding);
        let Some(frame) = self.frames.get_mut(&id) else {
            return false;
        };
        frame.geometry = Geometry::new(fitted.origin(), fitted.size());
        frame.contained_object_ids = contained;
        true
    }

    /// Recompute every auto-resize frame.
    pub fn recompute_frames(&mut self) {
        let ids: Vec<FrameId> = self
            .frames
            .values()
            .filter(|f| f.auto_resize)
            .map(|f| f.id)
            .collect();
        for id in ids {
            self.recompute_auto_resize(id);
        }
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    /// Frames back to front.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }
}
