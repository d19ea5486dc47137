//! FILENAME: core/engine/src/history.rs
//! PURPOSE: Undo/Redo history of grid state snapshots.
//! CONTEXT: Structural edits renumber rows and rewrite columns, so inverse
//! operations would be as complex as the edits themselves. Instead the store
//! records the whole GridState before each committed change and swaps
//! snapshots on undo/redo.

use std::collections::VecDeque;

use crate::state::GridState;

/// Maximum number of undo steps to keep.
const MAX_HISTORY_SIZE: usize = 100;

/// The state before one committed change.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Human-readable description (e.g., "Merge rows", "Edit qty")
    pub description: String,
    pub snapshot: GridState,
}

#[derive(Debug)]
pub struct History {
    /// Most recent at back
    undo_stack: VecDeque<HistoryEntry>,
    /// Most recent at back
    redo_stack: VecDeque<HistoryEntry>,
    max_size: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_max_size(MAX_HISTORY_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        History {
            undo_stack: VecDeque::with_capacity(max_size.min(MAX_HISTORY_SIZE)),
            redo_stack: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Records the state before a change. Clears redo.
    pub fn record(&mut self, description: impl Into<String>, before: GridState) {
        self.redo_stack.clear();
        push_bounded(
            &mut self.undo_stack,
            self.max_size,
            HistoryEntry {
                description: description.into(),
                snapshot: before,
            },
        );
    }

    /// Steps back. `current` becomes the redo target; returns the state to restore.
    pub fn undo(&mut self, current: GridState) -> Option<GridState> {
        let entry = self.undo_stack.pop_back()?;
        push_bounded(
            &mut self.redo_stack,
            self.max_size,
            HistoryEntry {
                description: entry.description.clone(),
                snapshot: current,
            },
        );
        Some(entry.snapshot)
    }

    /// Steps forward again without clearing the rest of the redo stack.
    pub fn redo(&mut self, current: GridState) -> Option<GridState> {
        let entry = self.redo_stack.pop_back()?;
        push_bounded(
            &mut self.undo_stack,
            self.max_size,
            HistoryEntry {
                description: entry.description.clone(),
                snapshot: current,
            },
        );
        Some(entry.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the next undo step (for UI).
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Description of the next redo step (for UI).
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Current stack sizes (for debugging).
    pub fn stack_sizes(&self) -> (usize, usize) {
        (self.undo_stack.len(), self.redo_stack.len())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(stack: &mut VecDeque<HistoryEntry>, max_size: usize, entry: HistoryEntry) {
    while stack.len() >= max_size {
        stack.pop_front();
    }
    stack.push_back(entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_page(page: usize) -> GridState {
        GridState {
            page,
            ..Default::default()
        }
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::new();
        history.record("Add row", state_with_page(0));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let restored = history.undo(state_with_page(1)).unwrap();
        assert_eq!(restored.page, 0);
        assert!(history.can_redo());
        assert_eq!(history.redo_description(), Some("Add row"));

        let again = history.redo(restored).unwrap();
        assert_eq!(again.page, 1);
        assert!(history.can_undo());
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut history = History::new();
        assert!(history.undo(GridState::default()).is_none());
        assert!(history.redo(GridState::default()).is_none());
    }

    #[test]
    fn test_redo_cleared_on_new_record() {
        let mut history = History::new();
        history.record("A", state_with_page(0));
        history.undo(state_with_page(1));
        assert!(history.can_redo());

        history.record("B", state_with_page(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_size_enforcement() {
        let mut history = History::with_max_size(3);
        for page in 0..4 {
            history.record("step", state_with_page(page));
        }
        assert_eq!(history.stack_sizes().0, 3);

        // Oldest snapshot was evicted
        let mut current = state_with_page(9);
        let mut pages = Vec::new();
        while let Some(prev) = history.undo(current.clone()) {
            pages.push(prev.page);
            current = prev;
        }
        assert_eq!(pages, vec![3, 2, 1]);
    }

    #[test]
    fn test_default_bound_is_one_hundred() {
        let mut history = History::default();
        for _ in 0..150 {
            history.record("step", GridState::default());
        }
        assert_eq!(history.stack_sizes(), (100, 0));
    }
}
