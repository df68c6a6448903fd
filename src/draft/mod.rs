//! Draft module: the canonical mutable post state and its store.

pub mod model;
pub mod store;

pub use model::{ArcLink, Background, Draft, DraftContent, Platform, Quality, Slide};
pub use store::{ChangeKind, DraftStore};
