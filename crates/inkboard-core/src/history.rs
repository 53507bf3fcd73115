//! Bounded snapshot history for undo/redo.

/// Maximum number of snapshots kept by default.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// One entry of the history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub index: usize,
    pub serialized_scene: String,
}

/// Linear history of serialized scenes.
///
/// Always holds at least the baseline entry; `index` points at the entry
/// matching the current scene.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    capacity: usize,
}

impl History {
    /// Start a history whose only entry is `baseline`.
    pub fn new(baseline: String, capacity: usize) -> Self {
        Self {
            entries: vec![baseline],
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new state after a discrete mutation.
    ///
    /// Entries after the current index are discarded and the oldest entry is
    /// evicted beyond capacity. Returns false when `serialized` equals the
    /// current entry.
    pub fn push(&mut self, serialized: String) -> bool {
        if self.entries[self.index] == serialized {
            return false;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(serialized);
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        self.index = self.entries.len() - 1;
        true
    }

    /// Step back. Returns the state to restore.
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    /// Step forward. Returns the state to restore.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> HistorySnapshot {
        HistorySnapshot {
            index: self.index,
            serialized_scene: self.entries[self.index].clone(),
        }
    }

    /// Drop everything and start over from `baseline`.
    pub fn reset(&mut self, baseline: String) {
        self.entries.clear();
        self.entries.push(baseline);
        self.index = 0;
    }
}
