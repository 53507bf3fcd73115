//! Exchange types for an external diagram assistant.
//!
//! The assistant itself lives outside the engine: it receives an
//! [`AssistContext`] describing part of the canvas and answers with a
//! [`CandidateScene`] that the canvas inserts as one undoable step.

use crate::connection::ConnectionMode;
use crate::scene::Scene;
use crate::shapes::{ObjectId, ShapeType};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One object as seen by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextObject {
    pub id: ObjectId,
    pub kind: ShapeType,
    pub label: String,
    pub bounds: Rect,
}

/// A connection between two objects of the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextLink {
    pub from: ObjectId,
    pub to: ObjectId,
    pub mode: ConnectionMode,
}

/// Snapshot of a canvas region handed to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistContext {
    pub region: Rect,
    pub objects: Vec<ContextObject>,
    pub connections: Vec<ContextLink>,
}

/// A shape proposed by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateShape {
    pub kind: ShapeType,
    #[serde(default)]
    pub label: Option<String>,
}

/// A proposed link between two candidate shapes, by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLink {
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub mode: ConnectionMode,
}

/// The assistant's answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateScene {
    pub shapes: Vec<CandidateShape>,
    #[serde(default)]
    pub links: Vec<CandidateLink>,
}

impl CandidateScene {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Scene {
    /// Describe the objects fully inside `region` and the connections
    /// among them.
    pub fn context_for(&self, region: Rect) -> AssistContext {
        let ids = self.objects_within(region);
        let inside: HashSet<ObjectId> = ids.iter().copied().collect();

        let objects = ids
            .iter()
            .filter_map(|id| self.find_by_id(*id))
            .map(|o| ContextObject {
                id: o.id(),
                kind: o.shape_type(),
                label: o.label.clone(),
                bounds: o.bounds(),
            })
            .collect();

        let connections = self
            .connections()
            .filter(|c| inside.contains(&c.from_node_id) && inside.contains(&c.to_node_id))
            .map(|c| ContextLink {
                from: c.from_node_id,
                to: c.to_node_id,
                mode: c.mode,
            })
            .collect();

        AssistContext {
            region,
            objects,
            connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SceneObject;
    use kurbo::Point;

    #[test]
    fn test_context_lists_region_and_internal_links() {
        let mut scene = Scene::new();
        let a = scene
            .add_object(SceneObject::with_defaults(ShapeType::Rectangle, Point::new(0.0, 0.0)))
            .unwrap();
        let b = scene
            .add_object(SceneObject::with_defaults(ShapeType::Ellipse, Point::new(200.0, 0.0)))
            .unwrap();
        let outside = scene
            .add_object(SceneObject::with_defaults(ShapeType::Ellipse, Point::new(2000.0, 0.0)))
            .unwrap();
        scene.connect(a, b, ConnectionMode::Directional);
        scene.connect(a, outside, ConnectionMode::Directional);

        let context = scene.context_for(Rect::new(-10.0, -10.0, 500.0, 500.0));
        assert_eq!(context.objects.len(), 2);
        assert_eq!(context.objects[0].kind, ShapeType::Rectangle);
        assert_eq!(context.objects[0].label, "Rectangle");
        assert_eq!(context.connections.len(), 1);
        assert_eq!(context.connections[0].to, b);
    }

    #[test]
    fn test_candidate_parses_with_defaults() {
        let json = r#"{"shapes": [{"kind": "diamond"}, {"kind": "sticky", "label": "Idea"}],
            "links": [{"from": 0, "to": 1}]}"#;
        let candidate: CandidateScene = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.shapes[0].kind, ShapeType::Diamond);
        assert_eq!(candidate.shapes[1].label.as_deref(), Some("Idea"));
        assert_eq!(candidate.links[0].mode, ConnectionMode::Directional);
    }
}
