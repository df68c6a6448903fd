//! History module: snapshot-based undo/redo for the draft store.

pub mod manager;

pub use manager::{HistoryManager, HistorySnapshot};
