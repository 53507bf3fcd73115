//! Persistent connections between two scene objects.

use crate::scene::Scene;
use crate::shapes::ObjectId;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use uuid::Uuid;

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// Gap left between an endpoint anchor and the drawn line.
pub const ARROW_CLEARANCE: f64 = 15.0;
/// Length of a drawn arrowhead.
pub const ARROWHEAD_LENGTH: f64 = 12.0;
/// Half-angle of a drawn arrowhead.
const ARROWHEAD_HALF_ANGLE: f64 = PI / 7.0;

/// Whether a connection points one way or both ways.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    #[default]
    Directional,
    Bidirectional,
}

/// An arrowhead drawn at `tip`, pointing in direction `angle` (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrowhead {
    pub tip: Point,
    pub angle: f64,
}

impl Arrowhead {
    /// The triangle (tip, left wing, right wing) for drawing.
    pub fn triangle(&self) -> [Point; 3] {
        let back = self.angle + PI;
        let wing = |offset: f64| {
            let a = back + offset;
            self.tip + Vec2::new(a.cos(), a.sin()) * ARROWHEAD_LENGTH
        };
        [self.tip, wing(ARROWHEAD_HALF_ANGLE), wing(-ARROWHEAD_HALF_ANGLE)]
    }
}

/// Geometry of a connection, recomputed whenever an endpoint moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPath {
    /// Center of the source object's bounds.
    pub from_anchor: Point,
    /// Center of the target object's bounds.
    pub to_anchor: Point,
    /// Drawn line start, offset from `from_anchor` by the clearance.
    pub start: Point,
    /// Drawn line end, offset from `to_anchor` by the clearance.
    pub end: Point,
    /// Line angle in radians, from source to target.
    pub angle: f64,
    pub arrowheads: Vec<Arrowhead>,
}

impl ConnectionPath {
    /// Compute the path between two bounding boxes.
    pub fn compute(from: Rect, to: Rect, mode: ConnectionMode) -> Self {
        let from_anchor = from.center();
        let to_anchor = to.center();
        let delta = to_anchor - from_anchor;
        let angle = delta.y.atan2(delta.x);
        let dir = Vec2::new(angle.cos(), angle.sin());
        let start = from_anchor + dir * ARROW_CLEARANCE;
        let end = to_anchor - dir * ARROW_CLEARANCE;

        let mut arrowheads = vec![Arrowhead { tip: end, angle }];
        if mode == ConnectionMode::Bidirectional {
            arrowheads.push(Arrowhead {
                tip: start,
                angle: angle + PI,
            });
        }

        Self {
            from_anchor,
            to_anchor,
            start,
            end,
            angle,
            arrowheads,
        }
    }
}

/// A persistent edge between two objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub from_node_id: ObjectId,
    pub to_node_id: ObjectId,
    pub mode: ConnectionMode,
    pub cached_path: ConnectionPath,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether this connection has `node` as either endpoint.
    pub fn touches(&self, node: ObjectId) -> bool {
        self.from_node_id == node || self.to_node_id == node
    }
}

impl Scene {
    /// Connect two objects.
    ///
    /// Returns `None` when `from == to`, either object is unknown, or the
    /// same ordered pair is already connected.
    pub fn connect(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        mode: ConnectionMode,
    ) -> Option<ConnectionId> {
        if from == to {
            log::debug!("ignoring self-connection on {from}");
            return None;
        }
        let (Some(from_obj), Some(to_obj)) = (self.objects.get(&from), self.objects.get(&to)) else {
            log::debug!("ignoring connection with unknown endpoint {from} -> {to}");
            return None;
        };
        if self
            .connections
            .values()
            .any(|c| c.from_node_id == from && c.to_node_id == to)
        {
            log::debug!("connection {from} -> {to} already exists");
            return None;
        }

        let cached_path = ConnectionPath::compute(from_obj.bounds(), to_obj.bounds(), mode);
        let id = Uuid::new_v4();
        self.connections.insert(
            id,
            Connection {
                id,
                from_node_id: from,
                to_node_id: to,
                mode,
                cached_path,
            },
        );
        for node in [from, to] {
            if let Some(object) = self.objects.get_mut(&node) {
                object.metadata.connection_ids.push(id);
            }
        }
        Some(id)
    }

    /// Remove a single connection.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&id)?;
        for node in [connection.from_node_id, connection.to_node_id] {
            if let Some(object) = self.objects.get_mut(&node) {
                object.metadata.connection_ids.retain(|&c| c != id);
            }
        }
        Some(connection)
    }

    /// Remove every connection touching `node`. Returns how many were removed.
    pub(crate) fn remove_connections_for(&mut self, node: ObjectId) -> usize {
        let ids: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.touches(node))
            .map(|c| c.id)
            .collect();
        for id in &ids {
            self.remove_connection(*id);
        }
        ids.len()
    }

    /// Recompute the cached path of every connection touching `node`.
    pub fn update_for_endpoint_move(&mut self, node: ObjectId) {
        let objects = &self.objects;
        for connection in self.connections.values_mut().filter(|c| c.touches(node)) {
            let (Some(from), Some(to)) = (
                objects.get(&connection.from_node_id),
                objects.get(&connection.to_node_id),
            ) else {
                continue;
            };
            connection.cached_path =
                ConnectionPath::compute(from.bounds(), to.bounds(), connection.mode);
        }
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// All connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections touching `node`.
    pub fn connections_for(&self, node: ObjectId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.touches(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{SceneObject, ShapeType};

    fn scene_with_pair() -> (Scene, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let a = scene
            .add_object(SceneObject::with_defaults(ShapeType::Rectangle, Point::new(100.0, 100.0)))
            .unwrap();
        let b = scene
            .add_object(SceneObject::with_defaults(ShapeType::Ellipse, Point::new(400.0, 100.0)))
            .unwrap();
        (scene, a, b)
    }

    #[test]
    fn test_path_offsets_by_clearance() {
        let from = Rect::new(0.0, 0.0, 100.0, 100.0);
        let to = Rect::new(300.0, 0.0, 400.0, 100.0);
        let path = ConnectionPath::compute(from, to, ConnectionMode::Directional);
        assert_eq!(path.from_anchor, Point::new(50.0, 50.0));
        assert!((path.start.x - 65.0).abs() < 1e-9);
        assert!((path.end.x - 335.0).abs() < 1e-9);
        assert!(path.angle.abs() < 1e-12);
        assert_eq!(path.arrowheads.len(), 1);
        assert_eq!(path.arrowheads[0].tip, path.end);
    }

    #[test]
    fn test_bidirectional_has_two_heads() {
        let from = Rect::new(0.0, 0.0, 10.0, 10.0);
        let to = Rect::new(0.0, 100.0, 10.0, 110.0);
        let path = ConnectionPath::compute(from, to, ConnectionMode::Bidirectional);
        assert_eq!(path.arrowheads.len(), 2);
        assert!((path.arrowheads[1].angle - (path.angle + PI)).abs() < 1e-12);
        let triangle = path.arrowheads[0].triangle();
        // Head points down, so wings sit above the tip.
        assert!(triangle[1].y < triangle[0].y);
        assert!(triangle[2].y < triangle[0].y);
    }

    #[test]
    fn test_connect_rejects_invalid() {
        let (mut scene, a, _) = scene_with_pair();
        assert!(scene.connect(a, a, ConnectionMode::Directional).is_none());
        assert!(scene.connect(a, Uuid::new_v4(), ConnectionMode::Directional).is_none());
        assert_eq!(scene.connections().count(), 0);
    }

    #[test]
    fn test_duplicate_pair_is_noop() {
        let (mut scene, a, b) = scene_with_pair();
        assert!(scene.connect(a, b, ConnectionMode::Directional).is_some());
        assert!(scene.connect(a, b, ConnectionMode::Bidirectional).is_none());
        // The reverse direction is a different ordered pair.
        assert!(scene.connect(b, a, ConnectionMode::Directional).is_some());
        assert_eq!(scene.connections().count(), 2);
    }

    #[test]
    fn test_metadata_tracks_connections() {
        let (mut scene, a, b) = scene_with_pair();
        let id = scene.connect(a, b, ConnectionMode::Directional).unwrap();
        assert_eq!(scene.find_by_id(a).unwrap().metadata.connection_ids, vec![id]);
        assert_eq!(scene.find_by_id(b).unwrap().metadata.connection_ids, vec![id]);

        scene.remove_connection(id);
        assert!(scene.find_by_id(a).unwrap().metadata.connection_ids.is_empty());
        assert!(scene.find_by_id(b).unwrap().metadata.connection_ids.is_empty());
    }

    #[test]
    fn test_moving_endpoint_updates_path() {
        let (mut scene, a, b) = scene_with_pair();
        let id = scene.connect(a, b, ConnectionMode::Directional).unwrap();
        let before = scene.connection(id).unwrap().cached_path.clone();

        scene.set_object_position(a, Point::new(100.0, 300.0));

        let after = &scene.connection(id).unwrap().cached_path;
        assert_ne!(after.start, before.start);
        assert_eq!(after.to_anchor, before.to_anchor);
        assert_eq!(after.from_anchor, Point::new(180.0, 350.0));
        let touching: Vec<_> = scene
            .connections()
            .filter(|c| c.touches(a) && c.touches(b))
            .collect();
        assert_eq!(touching.len(), 1);
        assert_eq!(touching[0].to_node_id, b);
    }

    #[test]
    fn test_removing_endpoint_removes_connection() {
        let (mut scene, a, b) = scene_with_pair();
        scene.connect(a, b, ConnectionMode::Directional).unwrap();
        scene.remove_object(a);
        assert_eq!(scene.connections().count(), 0);
        assert!(scene.find_by_id(b).unwrap().metadata.connection_ids.is_empty());
    }
}
