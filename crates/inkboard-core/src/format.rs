//! Versioned scene serialization and the native exchange bundle.

use crate::connection::{Connection, ConnectionPath};
use crate::frame::Frame;
use crate::scene::Scene;
use crate::shapes::{ObjectId, SceneObject};
use crate::viewport::Viewport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Current scene format version.
pub const SCENE_VERSION: u32 = 1;
/// Format tag written into native bundles.
pub const BUNDLE_FORMAT: &str = "inkboard";
/// Current native bundle version.
pub const BUNDLE_VERSION: u32 = 1;

/// Errors raised while importing a scene or bundle.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported format: {0}")]
    Format(String),
    #[error("Unsupported version {found}, expected {expected}")]
    Version { found: u64, expected: u32 },
    #[error("Broken reference: {0}")]
    Integrity(String),
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Serialized form of a scene and its viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub version: u32,
    /// Objects back to front.
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Frames back to front.
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl Default for SceneData {
    fn default() -> Self {
        Self {
            version: SCENE_VERSION,
            objects: Vec::new(),
            connections: Vec::new(),
            frames: Vec::new(),
            viewport: Viewport::default(),
        }
    }
}

impl SceneData {
    pub fn from_scene(scene: &Scene, viewport: &Viewport) -> Self {
        Self {
            version: SCENE_VERSION,
            objects: scene.objects().cloned().collect(),
            connections: scene.connections().cloned().collect(),
            frames: scene.frames().cloned().collect(),
            viewport: viewport.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and validate serialized scene JSON.
    pub fn parse(json: &str) -> ImportResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Validate a JSON value as a scene. The version is checked before the
    /// body is decoded.
    pub fn from_value(value: Value) -> ImportResult<Self> {
        check_version(&value, SCENE_VERSION)?;
        let data: SceneData = serde_json::from_value(value)?;
        data.validate()?;
        Ok(data)
    }

    /// Check ids are unique and every reference points at a live object.
    pub fn validate(&self) -> ImportResult<()> {
        if self.version != SCENE_VERSION {
            return Err(ImportError::Version {
                found: self.version.into(),
                expected: SCENE_VERSION,
            });
        }

        let mut objects = HashSet::new();
        for object in &self.objects {
            if !objects.insert(object.id()) {
                return Err(ImportError::Integrity(format!(
                    "duplicate object id {}",
                    object.id()
                )));
            }
            if !object.geometry.is_finite() {
                return Err(ImportError::Integrity(format!(
                    "object {} has non-finite geometry",
                    object.id()
                )));
            }
        }

        let mut connections = HashSet::new();
        for connection in &self.connections {
            if !connections.insert(connection.id()) {
                return Err(ImportError::Integrity(format!(
                    "duplicate connection id {}",
                    connection.id()
                )));
            }
            for node in [connection.from_node_id, connection.to_node_id] {
                if !objects.contains(&node) {
                    return Err(ImportError::Integrity(format!(
                        "connection {} references missing object {node}",
                        connection.id()
                    )));
                }
            }
            if connection.from_node_id == connection.to_node_id {
                return Err(ImportError::Integrity(format!(
                    "connection {} connects an object to itself",
                    connection.id()
                )));
            }
        }

        let mut frames = HashSet::new();
        for frame in &self.frames {
            if !frames.insert(frame.id()) {
                return Err(ImportError::Integrity(format!(
                    "duplicate frame id {}",
                    frame.id()
                )));
            }
            if let Some(missing) = frame
                .contained_object_ids
                .iter()
                .find(|id| !objects.contains(*id))
            {
                return Err(ImportError::Integrity(format!(
                    "frame {} contains missing object {missing}",
                    frame.id()
                )));
            }
        }
        Ok(())
    }

    /// Build a live scene from validated data.
    ///
    /// Connection bookkeeping and cached paths are rebuilt from the
    /// connection list rather than trusted from the input.
    pub fn into_scene(self, frame_padding: f64) -> ImportResult<(Scene, Viewport)> {
        self.validate()?;
        let mut scene = Scene::with_frame_padding(frame_padding);

        for mut object in self.objects {
            let id = object.id();
            object.metadata.node_id = id.to_string();
            object.metadata.connection_ids.clear();
            scene.z_order.push(id);
            scene.objects.insert(id, object);
        }
        scene.last_created = scene.z_order.last().copied();

        for mut connection in self.connections {
            let id = connection.id();
            let endpoints = [connection.from_node_id, connection.to_node_id];
            if let (Some(from), Some(to)) = (
                scene.objects.get(&endpoints[0]),
                scene.objects.get(&endpoints[1]),
            ) {
                connection.cached_path =
                    ConnectionPath::compute(from.bounds(), to.bounds(), connection.mode);
            }
            for node in endpoints {
                if let Some(object) = scene.objects.get_mut(&node) {
                    object.metadata.connection_ids.push(id);
                }
            }
            scene.connections.insert(id, connection);
        }

        for frame in self.frames {
            scene.insert_frame(frame);
        }

        let mut viewport = self.viewport;
        viewport.set_zoom(viewport.zoom_percent());
        Ok((scene, viewport))
    }

    /// Ids of every object in the data, in order.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id()).collect()
    }
}

/// Self-describing, re-importable export of one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeBundle {
    pub format: String,
    pub version: u32,
    pub name: String,
    pub exported_at: DateTime<Utc>,
    pub scene: SceneData,
}

impl NativeBundle {
    pub fn new(name: impl Into<String>, scene: SceneData) -> Self {
        Self {
            format: BUNDLE_FORMAT.to_string(),
            version: BUNDLE_VERSION,
            name: name.into(),
            exported_at: Utc::now(),
            scene,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a bundle, validating format tag, version and scene integrity.
    pub fn parse(json: &str) -> ImportResult<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        match value.get("format").and_then(Value::as_str) {
            Some(BUNDLE_FORMAT) => {}
            Some(other) => return Err(ImportError::Format(other.to_string())),
            None => return Err(ImportError::Format("missing format tag".to_string())),
        }
        check_version(&value, BUNDLE_VERSION)?;

        let scene = value
            .get_mut("scene")
            .map(Value::take)
            .ok_or_else(|| ImportError::Format("missing scene".to_string()))?;
        let scene = SceneData::from_value(scene)?;

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Header {
            name: String,
            exported_at: DateTime<Utc>,
        }
        let header: Header = serde_json::from_value(value)?;

        Ok(Self {
            format: BUNDLE_FORMAT.to_string(),
            version: BUNDLE_VERSION,
            name: header.name,
            exported_at: header.exported_at,
            scene,
        })
    }
}

fn check_version(value: &Value, expected: u32) -> ImportResult<()> {
    match value.get("version").and_then(Value::as_u64) {
        Some(found) if found == u64::from(expected) => Ok(()),
        Some(found) => Err(ImportError::Version { found, expected }),
        None => Err(ImportError::Format("missing version".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionMode;
    use crate::shapes::ShapeType;
    use kurbo::{Point, Size};

    fn sample() -> (Scene, Viewport) {
        let mut scene = Scene::new();
        let a = scene
            .add_object(SceneObject::with_defaults(ShapeType::Rectangle, Point::new(0.0, 0.0)))
            .unwrap();
        let b = scene
            .add_object(SceneObject::with_defaults(ShapeType::Sticky, Point::new(400.0, 0.0)))
            .unwrap();
        scene.connect(a, b, ConnectionMode::Bidirectional).unwrap();
        scene.create_frame(Point::new(-1000.0, -1000.0), Size::new(50.0, 50.0));
        let mut viewport = Viewport::new();
        viewport.set_zoom(150.0);
        (scene, viewport)
    }

    #[test]
    fn test_scene_roundtrip_preserves_order_and_links() {
        let (scene, viewport) = sample();
        let data = SceneData::from_scene(&scene, &viewport);
        let json = data.to_json().unwrap();
        let parsed = SceneData::parse(&json).unwrap();
        assert_eq!(parsed, data);

        let (restored, restored_viewport) = parsed.into_scene(40.0).unwrap();
        assert_eq!(restored.z_order(), scene.z_order());
        assert_eq!(restored.connections().count(), 1);
        assert_eq!(restored_viewport.zoom_percent(), 150.0);
        let first = restored.find_by_id(scene.z_order()[0]).unwrap();
        assert_eq!(first.metadata.connection_ids.len(), 1);
    }

    #[test]
    fn test_viewport_field_names() {
        let json = SceneData::default().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let viewport = &value["viewport"];
        assert_eq!(viewport["zoom"], 100.0);
        assert!(viewport.get("pan").is_some());
        assert!(viewport.get("gridVisible").is_some());
        assert!(viewport.get("gridSpacing").is_some());
        assert!(viewport.get("snapEnabled").is_some());
        assert_eq!(value["version"], 1);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let json = r#"{"version": 2, "objects": [], "someNewField": true}"#;
        assert!(matches!(
            SceneData::parse(json),
            Err(ImportError::Version { found: 2, .. })
        ));
    }

    #[test]
    fn test_dangling_connection_rejected() {
        let (scene, viewport) = sample();
        let mut data = SceneData::from_scene(&scene, &viewport);
        data.objects.remove(0);
        let json = data.to_json().unwrap();
        assert!(matches!(
            SceneData::parse(&json),
            Err(ImportError::Integrity(_))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(SceneData::parse("{nope"), Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_bundle_roundtrip() {
        let (scene, viewport) = sample();
        let bundle = NativeBundle::new("Roadmap", SceneData::from_scene(&scene, &viewport));
        let json = bundle.to_json_pretty().unwrap();
        let parsed = NativeBundle::parse(&json).unwrap();
        assert_eq!(parsed.name, "Roadmap");
        assert_eq!(parsed.scene.objects.len(), 2);
        assert_eq!(parsed.exported_at, bundle.exported_at);
    }

    #[test]
    fn test_bundle_wrong_format_rejected() {
        let json = r#"{"format": "excalidraw", "version": 1, "name": "x",
            "exportedAt": "2024-01-01T00:00:00Z", "scene": {"version": 1, "objects": []}}"#;
        assert!(matches!(NativeBundle::parse(json), Err(ImportError::Format(_))));
    }
}
