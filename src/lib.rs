//! Postcraft - drafting and export core for multi-slide social posts.
//!
//! Three concurrent processes share one mutable draft:
//!
//! - **Generation**: asynchronous requests against an external generation
//!   service that may resolve after the user already changed the draft by
//!   hand. A sequence-numbered arbiter discards superseded responses and
//!   parks conflicting ones for explicit confirmation.
//! - **History**: snapshot-based undo/redo that must not corrupt itself when
//!   state is replaced programmatically; replays run under an `applying`
//!   guard so they never enqueue new snapshots.
//! - **Export**: a deterministic render pipeline producing reproducible
//!   raster artifacts per platform, packaged for download and persisted
//!   through the backend.
//!
//! # Example
//!
//! ```rust
//! use postcraft::{EditorSession, Platform};
//!
//! let mut session = EditorSession::new("fitness");
//! session.begin_editing();
//!
//! // One user-edit batch: closes with one undo snapshot.
//! session.edit(|store| {
//!     store.set_headline(0, "Ten minute mobility").unwrap();
//!     store.set_caption_a("Start your morning right");
//!     store.select_platform(Platform::Feed);
//! });
//!
//! assert!(session.undo());
//! assert!(session.redo());
//! assert_eq!(session.store().caption_a(), "Start your morning right");
//! ```

pub mod draft;
pub mod error;
pub mod export;
pub mod generation;
pub mod history;
pub mod render;
pub mod session;

// Re-exports for convenience
pub use draft::{ArcLink, Background, Draft, DraftContent, DraftStore, Platform, Quality, Slide};
pub use error::{DraftError, DraftResult};
pub use export::{
    ExportArtifact, ExportJob, ExportOrchestrator, ExportOutcome, HttpPersistClient, PersistService,
};
pub use generation::{
    GeneratedPost, GenerationArbiter, GenerationError, GenerationService, GenerationTarget,
    HttpGenerationClient, RegenField,
};
pub use history::{HistoryManager, HistorySnapshot};
pub use render::{RenderContext, RenderPipeline, RenderTheme};
pub use session::{EditorSession, GenerateResult};
