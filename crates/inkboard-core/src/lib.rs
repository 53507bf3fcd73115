//! Inkboard Core Library
//!
//! Scene graph, editing tools, undo history and persistence for the
//! Inkboard whiteboard. Rendering lives in `inkboard-export`.

pub mod assist;
pub mod canvas;
pub mod config;
pub mod connection;
pub mod format;
pub mod frame;
pub mod history;
pub mod input;
pub mod scene;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod viewport;
pub mod workspace;

pub use assist::{AssistContext, CandidateLink, CandidateScene, CandidateShape};
pub use canvas::Canvas;
pub use config::EngineConfig;
pub use connection::{Connection, ConnectionId, ConnectionMode, ConnectionPath};
pub use format::{ImportError, NativeBundle, SceneData};
pub use frame::{Frame, FrameId};
pub use history::History;
pub use input::{Command, KeyEvent, Modifiers, MouseButton, PointerEvent, ShortcutRegistry};
pub use scene::{Scene, ZOrder};
pub use shapes::{ObjectId, Placement, SceneObject, ShapeKind, ShapeStyle, ShapeType};
pub use snap::{SnapResult, snap_to_grid};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use tools::{ToolKind, ToolManager};
pub use viewport::Viewport;
pub use workspace::{AuthContext, Workspace, WorkspaceError};
