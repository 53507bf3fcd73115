//! Scene graph: objects, connections and frames with z-order.

use crate::connection::{Connection, ConnectionId};
use crate::frame::{DEFAULT_FRAME_PADDING, Frame, FrameId};
use crate::shapes::{ObjectId, PlacementArea, SceneObject, union_bounds};
use indexmap::IndexMap;
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::HashMap;

/// Default hit-test tolerance in world units.
pub const HIT_TOLERANCE: f64 = 4.0;

/// Z-order change requested for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Front,
    Back,
    Forward,
    Backward,
}

/// Owns every object, connection and frame of one canvas.
///
/// Objects live in an id-keyed arena with a separate back-to-front z-order.
/// Connections and frames keep insertion order; frame iteration order is
/// back to front.
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) objects: HashMap<ObjectId, SceneObject>,
    pub(crate) z_order: Vec<ObjectId>,
    pub(crate) connections: IndexMap<ConnectionId, Connection>,
    pub(crate) frames: IndexMap<FrameId, Frame>,
    pub(crate) last_created: Option<ObjectId>,
    pub(crate) frame_padding: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_frame_padding(DEFAULT_FRAME_PADDING)
    }

    pub fn with_frame_padding(frame_padding: f64) -> Self {
        Self {
            objects: HashMap::new(),
            z_order: Vec::new(),
            connections: IndexMap::new(),
            frames: IndexMap::new(),
            last_created: None,
            frame_padding: frame_padding.max(0.0),
        }
    }

    pub fn frame_padding(&self) -> f64 {
        self.frame_padding
    }

    /// Add an object on top of the z-order.
    ///
    /// Returns `None` if an object with the same id already exists.
    pub fn add_object(&mut self, mut object: SceneObject) -> Option<ObjectId> {
        let id = object.id();
        if self.objects.contains_key(&id) {
            log::debug!("ignoring duplicate object id {id}");
            return None;
        }
        object.metadata.node_id = id.to_string();
        object.metadata.connection_ids.clear();
        self.z_order.push(id);
        self.objects.insert(id, object);
        self.last_created = Some(id);
        self.recompute_frames();
        Some(id)
    }

    /// Remove an object together with its connections and frame membership.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        if !self.objects.contains_key(&id) {
            log::debug!("ignoring removal of unknown object {id}");
            return None;
        }
        self.remove_connections_for(id);
        for frame in self.frames.values_mut() {
            frame.contained_object_ids.retain(|&o| o != id);
        }
        self.z_order.retain(|&o| o != id);
        if self.last_created == Some(id) {
            self.last_created = self.z_order.last().copied();
        }
        let removed = self.objects.remove(&id);
        self.recompute_frames();
        removed
    }

    /// Change an object's position in the z-order.
    /// Returns true if the order changed.
    pub fn reorder(&mut self, id: ObjectId, order: ZOrder) -> bool {
        let Some(pos) = self.z_order.iter().position(|&o| o == id) else {
            log::debug!("ignoring reorder of unknown object {id}");
            return false;
        };
        let last = self.z_order.len() - 1;
        match order {
            ZOrder::Front if pos < last => {
                self.z_order.remove(pos);
                self.z_order.push(id);
            }
            ZOrder::Back if pos > 0 => {
                self.z_order.remove(pos);
                self.z_order.insert(0, id);
            }
            ZOrder::Forward if pos < last => self.z_order.swap(pos, pos + 1),
            ZOrder::Backward if pos > 0 => self.z_order.swap(pos, pos - 1),
            _ => return false,
        }
        true
    }

    pub fn find_by_id(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Apply `update` to an object, then refresh its connections.
    ///
    /// The object's id and connection bookkeeping are preserved.
    pub fn update_object(&mut self, id: ObjectId, update: impl FnOnce(&mut SceneObject)) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            log::debug!("ignoring update of unknown object {id}");
            return false;
        };
        let metadata = object.metadata.clone();
        update(object);
        object.id = id;
        object.metadata = metadata;
        self.update_for_endpoint_move(id);
        true
    }

    /// Translate an object and refresh its connections.
    pub fn move_object(&mut self, id: ObjectId, delta: Vec2) -> bool {
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            return false;
        }
        self.update_object(id, |object| object.translate(delta))
    }

    /// Move an object's top-left to `position` and refresh its connections.
    pub fn set_object_position(&mut self, id: ObjectId, position: Point) -> bool {
        if !(position.x.is_finite() && position.y.is_finite()) {
            return false;
        }
        self.update_object(id, |object| object.geometry.position = position)
    }

    /// Resize an object and refresh its connections.
    pub fn resize_object(&mut self, id: ObjectId, size: Size) -> bool {
        let mut resized = false;
        let known = self.update_object(id, |object| resized = object.resize(size));
        known && resized
    }

    /// Objects whose bounding box lies fully inside `rect`, back to front.
    pub fn objects_within(&self, rect: Rect) -> Vec<ObjectId> {
        self.objects()
            .filter(|o| contains_rect(rect, o.bounds()))
            .map(|o| o.id())
            .collect()
    }

    /// Topmost object under `point`.
    pub fn object_at(&self, point: Point, tolerance: f64) -> Option<ObjectId> {
        self.z_order.iter().rev().copied().find(|id| {
            self.objects
                .get(id)
                .is_some_and(|o| o.hit_test(point, tolerance))
        })
    }

    /// Topmost frame whose bounds contain `point`.
    pub fn frame_at(&self, point: Point) -> Option<FrameId> {
        self.frames
            .values()
            .rev()
            .find(|f| f.bounds().contains(point))
            .map(|f| f.id())
    }

    /// Bounds of all objects and frames.
    pub fn bounds(&self) -> Option<Rect> {
        union_bounds(
            self.objects
                .values()
                .map(|o| o.bounds())
                .chain(self.frames.values().map(|f| f.bounds())),
        )
    }

    /// Objects back to front.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.z_order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn z_order(&self) -> &[ObjectId] {
        &self.z_order
    }

    pub fn last_created(&self) -> Option<&SceneObject> {
        self.last_created.and_then(|id| self.objects.get(&id))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.frames.is_empty()
    }

    /// Input for auto-placement inside `visible`.
    pub fn placement_area(&self, visible: Rect) -> PlacementArea {
        PlacementArea {
            visible,
            occupied: self.objects.values().map(|o| o.bounds()).collect(),
            last_created: self.last_created().map(|o| o.bounds()),
        }
    }
}

/// Whether `inner` lies fully inside `outer`.
pub(crate) fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}
