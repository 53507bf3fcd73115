//! Tool system: a table-shaped state machine from pointer input to actions.
//!
//! [`transition`] is pure. It decides what a pointer input means for the
//! active tool and returns a [`ToolAction`] for the canvas to carry out,
//! together with the next [`ToolState`].

use crate::connection::ConnectionMode;
use crate::frame::FrameId;
use crate::shapes::{ObjectId, ShapeStyle, ShapeType, StrokeBuilder};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    FreeDraw,
    Highlight,
    Erase,
    ShapePlacement(ShapeType),
    Connect,
    FrameCreate,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::FreeDraw => "pen",
            ToolKind::Highlight => "highlighter",
            ToolKind::Erase => "eraser",
            ToolKind::ShapePlacement(kind) => kind.name(),
            ToolKind::Connect => "connect",
            ToolKind::FrameCreate => "frame",
        }
    }
}

/// What lies under the pointer when it goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Object(ObjectId),
    /// Only reported while the frame tool is active.
    Frame(FrameId),
    Empty,
}

/// Pointer input in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolInput {
    Down { world: Point, screen: Point },
    Move { world: Point, screen: Point },
    Up { world: Point, screen: Point },
    /// Palette drag-and-drop, accepted by every tool.
    Drop { kind: ShapeType, point: Point },
}

/// In-progress interaction of the active tool.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        object: ObjectId,
        last: Point,
        moved: bool,
    },
    Panning {
        last: Point,
    },
    Drawing(StrokeBuilder),
    PendingConnect {
        from: ObjectId,
    },
    MovingFrame {
        frame: FrameId,
        last: Point,
        moved: bool,
    },
}

/// Active tool plus its gesture.
#[derive(Debug, Clone, Default)]
pub struct ToolState {
    pub tool: ToolKind,
    pub gesture: Gesture,
}

impl ToolState {
    pub fn new(tool: ToolKind) -> Self {
        Self {
            tool,
            gesture: Gesture::Idle,
        }
    }

    /// Abandon the current gesture.
    ///
    /// A drag that already moved something still has to be settled, so the
    /// returned action says so.
    pub fn interrupt(&mut self) -> ToolAction {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { object, moved, .. } => ToolAction::SettleObject { id: object, moved },
            Gesture::MovingFrame { frame, moved, .. } => ToolAction::SettleFrame { id: frame, moved },
            Gesture::PendingConnect { .. } => ToolAction::CancelConnect,
            Gesture::Idle | Gesture::Panning { .. } | Gesture::Drawing(_) => ToolAction::None,
        }
    }
}

/// Effect of an input, carried out by the canvas.
#[derive(Debug, Clone)]
pub enum ToolAction {
    None,
    /// Replace the selection.
    Select(Option<ObjectId>),
    MoveObject { id: ObjectId, delta: Vec2 },
    /// End of an object drag.
    SettleObject { id: ObjectId, moved: bool },
    /// Pan the viewport by a screen-space delta.
    Pan(Vec2),
    CommitStroke(StrokeBuilder),
    Erase(ObjectId),
    PlaceShape { kind: ShapeType, point: Point },
    PendingConnect(ObjectId),
    CancelConnect,
    Connect { from: ObjectId, to: ObjectId },
    CreateFrame(Point),
    MoveFrame { id: FrameId, delta: Vec2 },
    SettleFrame { id: FrameId, moved: bool },
}

/// Map `(state, input, hit)` to `(action, next state)`.
pub fn transition(state: ToolState, input: ToolInput, hit: Hit) -> (ToolAction, ToolState) {
    let ToolState { tool, gesture } = state;
    let stay = |gesture: Gesture| ToolState { tool, gesture };

    match (tool, gesture, input) {
        (_, gesture, ToolInput::Drop { kind, point }) => {
            (ToolAction::PlaceShape { kind, point }, stay(gesture))
        }

        // Select: click selects, drag moves.
        (ToolKind::Select, Gesture::Idle, ToolInput::Down { world, .. }) => match hit {
            Hit::Object(id) => (
                ToolAction::Select(Some(id)),
                stay(Gesture::Dragging {
                    object: id,
                    last: world,
                    moved: false,
                }),
            ),
            Hit::Frame(_) | Hit::Empty => (ToolAction::Select(None), stay(Gesture::Idle)),
        },
        (_, Gesture::Dragging { object, last, .. }, ToolInput::Move { world, .. }) => (
            ToolAction::MoveObject {
                id: object,
                delta: world - last,
            },
            stay(Gesture::Dragging {
                object,
                last: world,
                moved: true,
            }),
        ),
        (_, Gesture::Dragging { object, moved, .. }, ToolInput::Up { .. }) => {
            (ToolAction::SettleObject { id: object, moved }, stay(Gesture::Idle))
        }

        // Pan
        (ToolKind::Pan, Gesture::Idle, ToolInput::Down { screen, .. }) => {
            (ToolAction::None, stay(Gesture::Panning { last: screen }))
        }
        (_, Gesture::Panning { last }, ToolInput::Move { screen, .. }) => (
            ToolAction::Pan(screen - last),
            stay(Gesture::Panning { last: screen }),
        ),
        (_, Gesture::Panning { .. }, ToolInput::Up { .. }) => (ToolAction::None, stay(Gesture::Idle)),

        // Free draw and highlight
        (ToolKind::FreeDraw | ToolKind::Highlight, Gesture::Idle, ToolInput::Down { world, .. }) => {
            let builder = StrokeBuilder::new(world, tool == ToolKind::Highlight);
            (ToolAction::None, stay(Gesture::Drawing(builder)))
        }
        (_, Gesture::Drawing(mut builder), ToolInput::Move { world, .. }) => {
            builder.add_point(world);
            (ToolAction::None, stay(Gesture::Drawing(builder)))
        }
        (_, Gesture::Drawing(mut builder), ToolInput::Up { world, .. }) => {
            builder.add_point(world);
            (ToolAction::CommitStroke(builder), stay(Gesture::Idle))
        }

        // Erase
        (ToolKind::Erase, Gesture::Idle, ToolInput::Down { .. }) => match hit {
            Hit::Object(id) => (ToolAction::Erase(id), stay(Gesture::Idle)),
            Hit::Frame(_) | Hit::Empty => (ToolAction::None, stay(Gesture::Idle)),
        },

        // Shape placement
        (ToolKind::ShapePlacement(kind), Gesture::Idle, ToolInput::Down { world, .. }) => (
            ToolAction::PlaceShape { kind, point: world },
            stay(Gesture::Idle),
        ),

        // Connect: first click arms, second click commits.
        (ToolKind::Connect, Gesture::Idle, ToolInput::Down { .. }) => match hit {
            Hit::Object(id) => (
                ToolAction::PendingConnect(id),
                stay(Gesture::PendingConnect { from: id }),
            ),
            Hit::Frame(_) | Hit::Empty => (ToolAction::None, stay(Gesture::Idle)),
        },
        (ToolKind::Connect, Gesture::PendingConnect { from }, ToolInput::Down { .. }) => match hit {
            Hit::Object(id) if id == from => {
                (ToolAction::None, stay(Gesture::PendingConnect { from }))
            }
            Hit::Object(to) => (ToolAction::Connect { from, to }, stay(Gesture::Idle)),
            Hit::Frame(_) | Hit::Empty => (ToolAction::CancelConnect, stay(Gesture::Idle)),
        },

        // Frame create: empty click creates and returns to select.
        (ToolKind::FrameCreate, Gesture::Idle, ToolInput::Down { world, .. }) => match hit {
            Hit::Empty => (ToolAction::CreateFrame(world), ToolState::new(ToolKind::Select)),
            Hit::Frame(frame) => (
                ToolAction::None,
                stay(Gesture::MovingFrame {
                    frame,
                    last: world,
                    moved: false,
                }),
            ),
            Hit::Object(_) => (ToolAction::None, stay(Gesture::Idle)),
        },
        (_, Gesture::MovingFrame { frame, last, .. }, ToolInput::Move { world, .. }) => (
            ToolAction::MoveFrame {
                id: frame,
                delta: world - last,
            },
            stay(Gesture::MovingFrame {
                frame,
                last: world,
                moved: true,
            }),
        ),
        (_, Gesture::MovingFrame { frame, moved, .. }, ToolInput::Up { .. }) => {
            (ToolAction::SettleFrame { id: frame, moved }, stay(Gesture::Idle))
        }

        (_, gesture, _) => (ToolAction::None, stay(gesture)),
    }
}

/// Manages the current tool, its gesture and the style of new strokes.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    state: ToolState,
    /// Style applied to new free-draw and highlight strokes.
    pub current_style: ShapeStyle,
    /// Mode used by the connect tool.
    pub connection_mode: ConnectionMode,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tool(&self) -> ToolKind {
        self.state.tool
    }

    pub fn gesture(&self) -> &Gesture {
        &self.state.gesture
    }

    /// Switch tools. Any pending gesture is interrupted first.
    pub fn set_tool(&mut self, tool: ToolKind) -> ToolAction {
        let action = self.state.interrupt();
        self.state.tool = tool;
        action
    }

    /// Feed one input through [`transition`].
    pub fn handle(&mut self, input: ToolInput, hit: Hit) -> ToolAction {
        let state = std::mem::take(&mut self.state);
        let (action, next) = transition(state, input, hit);
        self.state = next;
        action
    }

    /// Abandon the current gesture, keeping the tool.
    pub fn cancel(&mut self) -> ToolAction {
        self.state.interrupt()
    }

    /// Drop the gesture without producing an action.
    pub(crate) fn reset_gesture(&mut self) {
        self.state.gesture = Gesture::Idle;
    }

    /// Source object armed by the connect tool, if any.
    pub fn pending_connection(&self) -> Option<ObjectId> {
        match self.state.gesture {
            Gesture::PendingConnect { from } => Some(from),
            _ => None,
        }
    }

    /// Points of the stroke being drawn, for preview.
    pub fn stroke_preview(&self) -> Option<&[Point]> {
        match &self.state.gesture {
            Gesture::Drawing(builder) => Some(builder.points()),
            _ => None,
        }
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.state.gesture, Gesture::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn down(x: f64, y: f64) -> ToolInput {
        ToolInput::Down {
            world: Point::new(x, y),
            screen: Point::new(x, y),
        }
    }

    fn moved(x: f64, y: f64) -> ToolInput {
        ToolInput::Move {
            world: Point::new(x, y),
            screen: Point::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> ToolInput {
        ToolInput::Up {
            world: Point::new(x, y),
            screen: Point::new(x, y),
        }
    }

    #[test]
    fn test_select_drag_settles() {
        let id = Uuid::new_v4();
        let mut tools = ToolManager::new();
        assert!(matches!(
            tools.handle(down(10.0, 10.0), Hit::Object(id)),
            ToolAction::Select(Some(selected)) if selected == id
        ));
        match tools.handle(moved(15.0, 12.0), Hit::Empty) {
            ToolAction::MoveObject { delta, .. } => assert_eq!(delta, Vec2::new(5.0, 2.0)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            tools.handle(up(15.0, 12.0), Hit::Empty),
            ToolAction::SettleObject { moved: true, .. }
        ));
        assert!(!tools.is_active());
    }

    #[test]
    fn test_click_without_move_settles_unmoved() {
        let id = Uuid::new_v4();
        let mut tools = ToolManager::new();
        tools.handle(down(0.0, 0.0), Hit::Object(id));
        assert!(matches!(
            tools.handle(up(0.0, 0.0), Hit::Empty),
            ToolAction::SettleObject { moved: false, .. }
        ));
    }

    #[test]
    fn test_connect_two_clicks() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Connect);
        tools.handle(down(0.0, 0.0), Hit::Object(a));
        assert_eq!(tools.pending_connection(), Some(a));

        // Clicking the same object keeps it armed.
        tools.handle(down(0.0, 0.0), Hit::Object(a));
        assert_eq!(tools.pending_connection(), Some(a));

        assert!(matches!(
            tools.handle(down(0.0, 0.0), Hit::Object(b)),
            ToolAction::Connect { from, to } if from == a && to == b
        ));
        assert_eq!(tools.pending_connection(), None);
    }

    #[test]
    fn test_connect_cancelled_by_empty_click() {
        let a = Uuid::new_v4();
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Connect);
        tools.handle(down(0.0, 0.0), Hit::Object(a));
        assert!(matches!(
            tools.handle(down(500.0, 500.0), Hit::Empty),
            ToolAction::CancelConnect
        ));
        assert_eq!(tools.pending_connection(), None);
    }

    #[test]
    fn test_tool_change_clears_pending_connect() {
        let a = Uuid::new_v4();
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Connect);
        tools.handle(down(0.0, 0.0), Hit::Object(a));
        tools.set_tool(ToolKind::Select);
        assert_eq!(tools.pending_connection(), None);
        tools.set_tool(ToolKind::Connect);
        assert_eq!(tools.pending_connection(), None);
    }

    #[test]
    fn test_tool_change_discards_stroke() {
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::FreeDraw);
        tools.handle(down(0.0, 0.0), Hit::Empty);
        tools.handle(moved(20.0, 0.0), Hit::Empty);
        assert_eq!(tools.stroke_preview().map(|p| p.len()), Some(2));
        assert!(matches!(tools.set_tool(ToolKind::Pan), ToolAction::None));
        assert!(tools.stroke_preview().is_none());
    }

    #[test]
    fn test_stroke_committed_on_up() {
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Highlight);
        tools.handle(down(0.0, 0.0), Hit::Empty);
        tools.handle(moved(20.0, 0.0), Hit::Empty);
        match tools.handle(up(40.0, 0.0), Hit::Empty) {
            ToolAction::CommitStroke(builder) => {
                assert!(builder.is_highlight());
                assert_eq!(builder.points().len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pan_uses_screen_delta() {
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Pan);
        tools.handle(down(0.0, 0.0), Hit::Object(Uuid::new_v4()));
        let action = tools.handle(
            ToolInput::Move {
                world: Point::new(1.0, 1.0),
                screen: Point::new(30.0, -10.0),
            },
            Hit::Empty,
        );
        assert!(matches!(action, ToolAction::Pan(delta) if delta == Vec2::new(30.0, -10.0)));
    }

    #[test]
    fn test_frame_create_returns_to_select() {
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::FrameCreate);
        assert!(matches!(
            tools.handle(down(5.0, 5.0), Hit::Empty),
            ToolAction::CreateFrame(_)
        ));
        assert_eq!(tools.current_tool(), ToolKind::Select);
    }

    #[test]
    fn test_frame_reposition_stays_in_frame_tool() {
        let frame = Uuid::new_v4();
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::FrameCreate);
        tools.handle(down(5.0, 5.0), Hit::Frame(frame));
        assert!(matches!(
            tools.handle(moved(15.0, 5.0), Hit::Empty),
            ToolAction::MoveFrame { delta, .. } if delta == Vec2::new(10.0, 0.0)
        ));
        assert!(matches!(
            tools.handle(up(15.0, 5.0), Hit::Empty),
            ToolAction::SettleFrame { moved: true, .. }
        ));
        assert_eq!(tools.current_tool(), ToolKind::FrameCreate);
    }

    #[test]
    fn test_drop_accepted_in_any_state() {
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Erase);
        assert!(matches!(
            tools.handle(
                ToolInput::Drop {
                    kind: ShapeType::Sticky,
                    point: Point::new(1.0, 2.0)
                },
                Hit::Empty
            ),
            ToolAction::PlaceShape {
                kind: ShapeType::Sticky,
                ..
            }
        ));
        assert_eq!(tools.current_tool(), ToolKind::Erase);
    }

    #[test]
    fn test_erase_on_pointer_down_only() {
        let id = Uuid::new_v4();
        let mut tools = ToolManager::new();
        tools.set_tool(ToolKind::Erase);
        assert!(matches!(
            tools.handle(moved(0.0, 0.0), Hit::Object(id)),
            ToolAction::None
        ));
        assert!(matches!(
            tools.handle(down(0.0, 0.0), Hit::Object(id)),
            ToolAction::Erase(erased) if erased == id
        ));
    }

    #[test]
    fn test_tool_change_settles_moved_drag() {
        let id = Uuid::new_v4();
        let mut tools = ToolManager::new();
        tools.handle(down(0.0, 0.0), Hit::Object(id));
        tools.handle(moved(10.0, 0.0), Hit::Empty);
        assert!(matches!(
            tools.set_tool(ToolKind::Pan),
            ToolAction::SettleObject { moved: true, .. }
        ));
        assert!(!tools.is_active());
    }
}
