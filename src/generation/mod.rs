//! Generation module: sequence-numbered requests against the external
//! generation service, reconciled against concurrent manual edits.

pub mod arbiter;
pub mod model;
pub mod service;

pub use arbiter::{
    GenerationArbiter, GenerationOutcome, GenerationTicket, PendingGeneration, PendingPayload,
};
pub use model::{
    FieldGenerationRequest, FieldValue, GeneratedPost, GenerationError, GenerationTarget,
    PostGenerationRequest, RegenField,
};
pub use service::{GenerationService, HttpGenerationClient};
