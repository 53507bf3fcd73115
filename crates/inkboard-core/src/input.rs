//! Pointer and keyboard events, and the keyboard shortcut registry.

use crate::scene::ZOrder;
use crate::shapes::ShapeType;
use crate::tools::ToolKind;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
    /// A palette item dropped onto the canvas.
    Drop {
        kind: ShapeType,
        position: Point,
    },
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name: a single character ("z", "]", "+") or a named key
    /// ("Delete", "Backspace", "Escape").
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    /// Parse a chord such as `"Ctrl+Shift+Z"` or `"]"`.
    pub fn parse(chord: &str) -> Option<Self> {
        let chord = chord.trim();
        if chord.is_empty() {
            return None;
        }
        // A lone "+" or a trailing "++" names the plus key itself.
        let (mods, key) = match chord.strip_suffix("++") {
            Some(rest) => (rest, "+"),
            None if chord == "+" => ("", "+"),
            None => match chord.rsplit_once('+') {
                Some((mods, key)) => (mods, key),
                None => ("", chord),
            },
        };
        if key.is_empty() {
            return None;
        }

        let mut modifiers = Modifiers::default();
        for part in mods.split('+').filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => return None,
            }
        }
        Some(Self::new(key, modifiers))
    }
}

/// An editor command bound to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetTool(ToolKind),
    Undo,
    Redo,
    DeleteSelection,
    Cancel,
    Reorder(ZOrder),
    ZoomIn,
    ZoomOut,
    ToggleGrid,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub command: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        command: Command,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether `event` triggers this shortcut.
    ///
    /// Shift is only compared for letters and named keys, since symbol keys
    /// such as `+` need Shift on some layouts.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if !self.key.eq_ignore_ascii_case(&event.key) {
            return false;
        }
        if self.ctrl != event.modifiers.command() || event.modifiers.alt {
            return false;
        }
        let is_symbol = self.key.len() == 1 && !self.key.chars().all(|c| c.is_ascii_alphanumeric());
        is_symbol || self.shift == event.modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
#[derive(Debug, Clone)]
pub struct ShortcutRegistry {
    shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        use Command::*;
        let shape = |kind| SetTool(ToolKind::ShapePlacement(kind));
        Self {
            shortcuts: vec![
                Shortcut::new("V", false, false, SetTool(ToolKind::Select), "Select tool"),
                Shortcut::new("H", false, false, SetTool(ToolKind::Pan), "Pan tool"),
                Shortcut::new("P", false, false, SetTool(ToolKind::FreeDraw), "Pen tool"),
                Shortcut::new("M", false, false, SetTool(ToolKind::Highlight), "Highlighter tool"),
                Shortcut::new("E", false, false, SetTool(ToolKind::Erase), "Eraser tool"),
                Shortcut::new("R", false, false, shape(ShapeType::Rectangle), "Rectangle"),
                Shortcut::new("O", false, false, shape(ShapeType::Ellipse), "Ellipse"),
                Shortcut::new("D", false, false, shape(ShapeType::Diamond), "Diamond"),
                Shortcut::new("T", false, false, shape(ShapeType::Text), "Text"),
                Shortcut::new("S", false, false, shape(ShapeType::Sticky), "Sticky note"),
                Shortcut::new("C", false, false, SetTool(ToolKind::Connect), "Connect tool"),
                Shortcut::new("F", false, false, SetTool(ToolKind::FrameCreate), "Frame tool"),
                Shortcut::new("Z", true, false, Undo, "Undo"),
                Shortcut::new("Z", true, true, Redo, "Redo"),
                Shortcut::new("Y", true, false, Redo, "Redo"),
                Shortcut::new("Delete", false, false, DeleteSelection, "Delete selection"),
                Shortcut::new("Backspace", false, false, DeleteSelection, "Delete selection"),
                Shortcut::new("Escape", false, false, Cancel, "Cancel current action"),
                Shortcut::new("]", false, false, Reorder(ZOrder::Forward), "Bring forward"),
                Shortcut::new("[", false, false, Reorder(ZOrder::Backward), "Send backward"),
                Shortcut::new("]", true, false, Reorder(ZOrder::Front), "Bring to front"),
                Shortcut::new("[", true, false, Reorder(ZOrder::Back), "Send to back"),
                Shortcut::new("+", false, false, ZoomIn, "Zoom in"),
                Shortcut::new("=", false, false, ZoomIn, "Zoom in"),
                Shortcut::new("-", false, false, ZoomOut, "Zoom out"),
                Shortcut::new("G", false, false, ToggleGrid, "Toggle grid"),
            ],
        }
    }

    pub fn all(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Command bound to `event`, if any.
    pub fn resolve(&self, event: &KeyEvent) -> Option<Command> {
        self.shortcuts
            .iter()
            .find(|s| s.matches(event))
            .map(|s| s.command)
    }
}
