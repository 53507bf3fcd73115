//! Per-document editing session.

use crate::assist::{AssistContext, CandidateScene};
use crate::config::EngineConfig;
use crate::connection::{ConnectionId, ConnectionMode};
use crate::format::{ImportResult, NativeBundle, SceneData};
use crate::frame::{DEFAULT_FRAME_SIZE, FrameId};
use crate::history::History;
use crate::input::{Command, KeyEvent, MouseButton, PointerEvent, ShortcutRegistry};
use crate::scene::{HIT_TOLERANCE, Scene, ZOrder};
use crate::shapes::{ObjectId, Placement, SceneObject, ShapeFactory, ShapeStyle, ShapeType};
use crate::tools::{Hit, ToolAction, ToolInput, ToolKind, ToolManager};
use crate::viewport::{Viewport, ZOOM_STEP};
use kurbo::{Point, Rect, Size, Vec2};

/// An open canvas: scene, view, tools and history.
///
/// Every mutation runs synchronously. Discrete mutations end with a history
/// snapshot, which bumps [`Canvas::revision`].
#[derive(Debug, Clone)]
pub struct Canvas {
    scene: Scene,
    viewport: Viewport,
    tools: ToolManager,
    history: History,
    shortcuts: ShortcutRegistry,
    factory: ShapeFactory,
    selection: Option<ObjectId>,
    frame_padding: f64,
    revision: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new(config: &EngineConfig) -> Self {
        let scene = Scene::with_frame_padding(config.frame_padding);
        let viewport = Viewport::with_grid_spacing(config.grid_spacing);
        Self::with_scene(scene, viewport, config)
    }

    /// Open a canvas from serialized scene JSON.
    pub fn from_json(json: &str, config: &EngineConfig) -> ImportResult<Self> {
        Self::from_scene_data(SceneData::parse(json)?, config)
    }

    /// Open a canvas from validated scene data. History starts at this scene.
    pub fn from_scene_data(data: SceneData, config: &EngineConfig) -> ImportResult<Self> {
        let (scene, viewport) = data.into_scene(config.frame_padding)?;
        Ok(Self::with_scene(scene, viewport, config))
    }

    fn with_scene(scene: Scene, viewport: Viewport, config: &EngineConfig) -> Self {
        let baseline = SceneData::from_scene(&scene, &viewport)
            .to_json()
            .unwrap_or_default();
        Self {
            scene,
            viewport,
            tools: ToolManager::new(),
            history: History::new(baseline, config.history_depth),
            shortcuts: ShortcutRegistry::new(),
            factory: ShapeFactory::new(config.placement_spacing, config.placement_margin),
            selection: None,
            frame_padding: config.frame_padding,
            revision: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable view state. Viewport changes are not recorded in history.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn select(&mut self, id: Option<ObjectId>) {
        self.selection = id.filter(|id| self.scene.find_by_id(*id).is_some());
    }

    /// Counter bumped by every recorded history change, undo and redo.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Serialized form of the current scene.
    pub fn scene_data(&self) -> SceneData {
        SceneData::from_scene(&self.scene, &self.viewport)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.scene_data().to_json()
    }

    /// Record the current scene in history.
    fn commit(&mut self) {
        match self.to_json() {
            Ok(json) => {
                if self.history.push(json) {
                    self.revision += 1;
                }
            }
            Err(e) => log::error!("failed to snapshot scene: {e}"),
        }
    }

    /// Replace scene and viewport from a history entry.
    fn restore(&mut self, json: &str) -> bool {
        let screen = self.viewport.screen_size();
        match SceneData::parse(json).and_then(|d| d.into_scene(self.frame_padding)) {
            Ok((scene, mut viewport)) => {
                viewport.set_screen_size(screen.width, screen.height);
                self.scene = scene;
                self.viewport = viewport;
                self.tools.reset_gesture();
                self.select(self.selection);
                true
            }
            Err(e) => {
                log::error!("failed to restore history entry: {e}");
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(json) = self.history.undo().map(str::to_owned) else {
            return false;
        };
        let restored = self.restore(&json);
        self.revision += 1;
        restored
    }

    pub fn redo(&mut self) -> bool {
        let Some(json) = self.history.redo().map(str::to_owned) else {
            return false;
        };
        let restored = self.restore(&json);
        self.revision += 1;
        restored
    }

    /// Create a shape with its kind defaults.
    pub fn add_shape(&mut self, kind: ShapeType, placement: Placement) -> Option<ObjectId> {
        let area = self.scene.placement_area(self.viewport.visible_world_rect());
        let object = self.factory.create(kind, placement, &area);
        self.add_object(object)
    }

    pub fn add_object(&mut self, object: SceneObject) -> Option<ObjectId> {
        if !object.geometry.is_finite() {
            log::debug!("ignoring object with non-finite geometry");
            return None;
        }
        let id = self.scene.add_object(object)?;
        self.commit();
        Some(id)
    }

    /// Remove an object, its connections and its frame membership.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        if self.scene.remove_object(id).is_none() {
            return false;
        }
        if self.selection == Some(id) {
            self.selection = None;
        }
        self.commit();
        true
    }

    pub fn reorder(&mut self, id: ObjectId, order: ZOrder) -> bool {
        if !self.scene.reorder(id, order) {
            return false;
        }
        self.commit();
        true
    }

    pub fn connect(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        mode: ConnectionMode,
    ) -> Option<ConnectionId> {
        let id = self.scene.connect(from, to, mode)?;
        self.commit();
        Some(id)
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        if self.scene.remove_connection(id).is_none() {
            log::debug!("ignoring removal of unknown connection {id}");
            return false;
        }
        self.commit();
        true
    }

    /// Create a frame and fit it to any objects already inside it.
    pub fn create_frame(&mut self, placement: Placement, size: Size) -> Option<FrameId> {
        let position = match placement {
            Placement::At(point) => point,
            Placement::Auto => {
                let area = self.scene.placement_area(self.viewport.visible_world_rect());
                self.factory.auto_position(size, &area)
            }
        };
        let id = self.scene.create_frame(position, size)?;
        self.scene.recompute_auto_resize(id);
        self.commit();
        Some(id)
    }

    pub fn remove_frame(&mut self, id: FrameId) -> bool {
        if self.scene.remove_frame(id).is_none() {
            return false;
        }
        self.commit();
        true
    }

    pub fn set_frame_auto_resize(&mut self, id: FrameId, auto_resize: bool) -> bool {
        if !self.scene.set_frame_auto_resize(id, auto_resize) {
            return false;
        }
        if auto_resize {
            self.scene.recompute_auto_resize(id);
        }
        self.commit();
        true
    }

    /// Translate an object as one settled step.
    pub fn move_object(&mut self, id: ObjectId, delta: Vec2) -> bool {
        if !self.scene.move_object(id, delta) {
            return false;
        }
        self.settle();
        true
    }

    /// Move an object's top-left corner as one settled step.
    pub fn set_object_position(&mut self, id: ObjectId, position: Point) -> bool {
        if !self.scene.set_object_position(id, position) {
            return false;
        }
        self.settle();
        true
    }

    pub fn resize_object(&mut self, id: ObjectId, size: Size) -> bool {
        if !self.scene.resize_object(id, size) {
            return false;
        }
        self.settle();
        true
    }

    pub fn set_style(&mut self, id: ObjectId, style: ShapeStyle) -> bool {
        if !self.scene.update_object(id, |o| o.style = style) {
            return false;
        }
        self.commit();
        true
    }

    pub fn set_label(&mut self, id: ObjectId, label: impl Into<String>) -> bool {
        let label = label.into();
        if !self.scene.update_object(id, |o| o.label = label) {
            return false;
        }
        self.commit();
        true
    }

    /// Frame recompute and snapshot after an object modification.
    fn settle(&mut self) {
        self.scene.recompute_frames();
        self.commit();
    }

    /// Switch tools, interrupting any gesture.
    pub fn set_tool(&mut self, tool: ToolKind) {
        let action = self.tools.set_tool(tool);
        self.apply(action);
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool()
    }

    /// Object armed by the connect tool, for highlighting.
    pub fn pending_connection(&self) -> Option<ObjectId> {
        self.tools.pending_connection()
    }

    /// Feed a pointer event through the active tool.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let input = match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => ToolInput::Down {
                world: self.viewport.screen_to_world(position),
                screen: position,
            },
            PointerEvent::Move { position } => ToolInput::Move {
                world: self.viewport.screen_to_world(position),
                screen: position,
            },
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => ToolInput::Up {
                world: self.viewport.screen_to_world(position),
                screen: position,
            },
            PointerEvent::Drop { kind, position } => ToolInput::Drop {
                kind,
                point: self.viewport.screen_to_world(position),
            },
            PointerEvent::Scroll { position, delta } => {
                let factor = if delta.y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                self.viewport.zoom_at(position, factor);
                return;
            }
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => return,
        };

        let hit = match input {
            ToolInput::Down { world, .. } => self.hit_test(world),
            _ => Hit::Empty,
        };
        let action = self.tools.handle(input, hit);
        self.apply(action);
    }

    fn hit_test(&self, world: Point) -> Hit {
        let tolerance = HIT_TOLERANCE / self.viewport.scale();
        if let Some(id) = self.scene.object_at(world, tolerance) {
            return Hit::Object(id);
        }
        if self.tools.current_tool() == ToolKind::FrameCreate {
            if let Some(id) = self.scene.frame_at(world) {
                return Hit::Frame(id);
            }
        }
        Hit::Empty
    }

    fn apply(&mut self, action: ToolAction) {
        match action {
            ToolAction::None | ToolAction::PendingConnect(_) | ToolAction::CancelConnect => {}
            ToolAction::Select(id) => self.select(id),
            ToolAction::MoveObject { id, delta } => {
                self.scene.move_object(id, delta);
            }
            ToolAction::SettleObject { moved, .. } => {
                if moved {
                    self.settle();
                }
            }
            ToolAction::Pan(delta) => self.viewport.pan_by(delta),
            ToolAction::CommitStroke(builder) => {
                if let Some(stroke) = builder.finish(&self.tools.current_style) {
                    self.add_object(stroke);
                }
            }
            ToolAction::Erase(id) => {
                self.remove_object(id);
            }
            ToolAction::PlaceShape { kind, point } => {
                let point = self.viewport.snap(point).point;
                self.add_shape(kind, Placement::At(point));
            }
            ToolAction::Connect { from, to } => {
                self.connect(from, to, self.tools.connection_mode);
            }
            ToolAction::CreateFrame(point) => {
                let point = self.viewport.snap(point).point;
                self.create_frame(Placement::At(point), DEFAULT_FRAME_SIZE);
            }
            ToolAction::MoveFrame { id, delta } => {
                self.scene.move_frame(id, delta);
            }
            ToolAction::SettleFrame { id, moved } => {
                if moved {
                    self.scene.recompute_auto_resize(id);
                    self.commit();
                }
            }
        }
    }

    /// Resolve and run a keyboard shortcut. Returns the command run, if any.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<Command> {
        let command = self.shortcuts.resolve(event)?;
        self.execute(command);
        Some(command)
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::SetTool(tool) => self.set_tool(tool),
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
            Command::DeleteSelection => {
                if let Some(id) = self.selection {
                    self.remove_object(id);
                }
            }
            Command::Cancel => {
                let action = self.tools.cancel();
                self.apply(action);
                self.selection = None;
            }
            Command::Reorder(order) => {
                if let Some(id) = self.selection {
                    self.reorder(id, order);
                }
            }
            Command::ZoomIn => {
                self.viewport.zoom_in();
            }
            Command::ZoomOut => {
                self.viewport.zoom_out();
            }
            Command::ToggleGrid => self.viewport.toggle_grid(),
        }
    }

    /// Replace the scene with an imported native bundle.
    ///
    /// On error the canvas is left untouched.
    pub fn import_bundle(&mut self, json: &str) -> ImportResult<()> {
        let bundle = NativeBundle::parse(json)?;
        self.replace_scene(bundle.scene)
    }

    /// Replace the scene with validated scene data, as one undoable step.
    pub fn replace_scene(&mut self, data: SceneData) -> ImportResult<()> {
        let (scene, mut viewport) = data.into_scene(self.frame_padding)?;
        let screen = self.viewport.screen_size();
        viewport.set_screen_size(screen.width, screen.height);
        self.tools.reset_gesture();
        self.scene = scene;
        self.viewport = viewport;
        self.selection = None;
        self.commit();
        Ok(())
    }

    pub fn export_bundle(&self, name: &str) -> NativeBundle {
        NativeBundle::new(name, self.scene_data())
    }

    /// Context for the assistant covering `region`.
    pub fn context_for(&self, region: Rect) -> AssistContext {
        self.scene.context_for(region)
    }

    /// Insert an assistant's candidate: shapes are auto-placed, links are
    /// connected by index. Recorded as a single history step.
    pub fn insert_candidate(&mut self, candidate: &CandidateScene) -> Vec<ObjectId> {
        let mut created = Vec::with_capacity(candidate.shapes.len());
        for shape in &candidate.shapes {
            let area = self.scene.placement_area(self.viewport.visible_world_rect());
            let mut object = self.factory.create(shape.kind, Placement::Auto, &area);
            if let Some(label) = &shape.label {
                object.label = label.clone();
            }
            if let Some(id) = self.scene.add_object(object) {
                created.push(id);
            }
        }
        for link in &candidate.links {
            match (created.get(link.from), created.get(link.to)) {
                (Some(&from), Some(&to)) => {
                    self.scene.connect(from, to, link.mode);
                }
                _ => log::debug!("ignoring candidate link {} -> {}", link.from, link.to),
            }
        }
        if !created.is_empty() {
            self.commit();
        }
        created
    }
}
