//! Export module: rendering orchestration, artifact packaging, and the
//! persistence service boundary.

pub mod model;
pub mod orchestrator;
pub mod service;

pub use model::{
    carousel_filename, multi_platform_filename, slide_filename, slug, ExportArtifact, ExportJob,
    ExportOutcome,
};
pub use orchestrator::ExportOrchestrator;
pub use service::{
    EpisodeUpsert, ExportRecord, HttpPersistClient, PersistService, PostPayload, PostRecord,
    SiblingSaveRequest,
};
