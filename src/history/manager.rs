//! HistoryManager implementation: a linear snapshot stack with a cursor.
//!
//! Snapshots are deep copies of the draft's editable subset, captured at
//! commit boundaries (the end of a user-edit batch). Undo/redo replays a
//! snapshot wholesale into the store under the `applying` guard, so replay
//! can never enqueue a new snapshot and corrupt the stack.

use chrono::{DateTime, Utc};

use crate::draft::{DraftContent, DraftStore};

/// Immutable deep copy of the editable draft subset, plus capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub content: DraftContent,
    pub captured_at: DateTime<Utc>,
}

impl HistorySnapshot {
    fn capture(content: &DraftContent) -> Self {
        Self {
            content: content.clone(),
            captured_at: Utc::now(),
        }
    }
}

/// Linear undo/redo stack over draft content snapshots.
///
/// Pushing while the cursor is behind the top truncates forward history.
/// Listening must be explicitly started so that wizard steps before the
/// editing phase do not accumulate irrelevant history.
pub struct HistoryManager {
    stack: Vec<HistorySnapshot>,
    cursor: usize,
    applying: bool,
    listening: bool,
}

impl HistoryManager {
    /// Creates an empty, non-listening history manager.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            cursor: 0,
            applying: false,
            listening: false,
        }
    }

    /// Resets the stack to a single entry capturing the given state.
    ///
    /// Used when entering the editing phase with freshly generated content,
    /// so the first undo cannot erase the generation result.
    pub fn init_from_state(&mut self, content: &DraftContent) {
        self.stack = vec![HistorySnapshot::capture(content)];
        self.cursor = 0;
    }

    /// Starts observing commit boundaries.
    pub fn start_listening(&mut self) {
        self.listening = true;
    }

    /// Stops observing commit boundaries.
    pub fn stop_listening(&mut self) {
        self.listening = false;
    }

    /// True while an undo/redo/programmatic replace is in progress.
    pub fn is_applying(&self) -> bool {
        self.applying
    }

    /// True if commit boundaries are currently recorded.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Number of snapshots on the stack.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// True if no snapshot has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// True if the cursor can move back.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True if the cursor can move forward.
    pub fn can_redo(&self) -> bool {
        !self.stack.is_empty() && self.cursor + 1 < self.stack.len()
    }

    /// Records one settled edit batch as a snapshot.
    ///
    /// Skipped while a replay is applying, while not listening, or when the
    /// content is identical to the snapshot under the cursor. Discards all
    /// snapshots ahead of the cursor. Returns whether a snapshot was pushed.
    pub fn record(&mut self, content: &DraftContent) -> bool {
        if self.applying || !self.listening {
            return false;
        }
        if let Some(current) = self.stack.get(self.cursor) {
            if current.content == *content {
                return false;
            }
        }
        if !self.stack.is_empty() {
            self.stack.truncate(self.cursor + 1);
        }
        self.stack.push(HistorySnapshot::capture(content));
        self.cursor = self.stack.len() - 1;
        true
    }

    /// Moves the cursor back one snapshot and replays it into the store.
    ///
    /// Returns whether an undo was performed.
    pub fn undo(&mut self, store: &mut DraftStore) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.replay(store);
        true
    }

    /// Moves the cursor forward one snapshot and replays it into the store.
    ///
    /// Returns whether a redo was performed.
    pub fn redo(&mut self, store: &mut DraftStore) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        self.replay(store);
        true
    }

    /// Runs a closure under the `applying` guard.
    ///
    /// Used for any programmatic whole-state replacement that must not be
    /// observed as a user edit (generation apply, undo/redo replay).
    pub fn with_applying<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.applying = true;
        let result = f(self);
        self.applying = false;
        result
    }

    fn replay(&mut self, store: &mut DraftStore) {
        let content = self.stack[self.cursor].content.clone();
        self.applying = true;
        store.replace_content(content);
        self.applying = false;
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
