//! EditorSession: the explicitly passed, single-owner editing context.
//!
//! Owns the draft store, the history manager and the generation arbiter, and
//! routes every mutation path through one place so the guarantees hold:
//! user-edit batches end in exactly one history record, undo/redo and
//! generation applies run under the `applying` guard, and generation
//! failures are converted to state instead of crossing an await boundary as
//! an unhandled error.

use tracing::debug;

use crate::draft::{Draft, DraftContent, DraftStore};
use crate::error::DraftResult;
use crate::export::{ExportJob, ExportOrchestrator, ExportOutcome, PersistService};
use crate::generation::{
    FieldGenerationRequest, GenerationArbiter, GenerationError, GenerationOutcome,
    GenerationService, GenerationTarget, PostGenerationRequest, RegenField,
};
use crate::history::HistoryManager;

/// Result of driving one generation call through the session.
#[derive(Debug)]
pub enum GenerateResult {
    /// Result applied to the draft immediately.
    Applied,
    /// Concurrent manual edit; result parked for explicit confirmation.
    PendingConfirmation,
    /// A newer request superseded this one; result discarded.
    Superseded,
    /// A generation of the same kind was already in flight; no-op.
    Rejected,
    /// The service call failed; classified for user display.
    Failed(GenerationError),
}

impl From<GenerationOutcome> for GenerateResult {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Applied => GenerateResult::Applied,
            GenerationOutcome::Superseded => GenerateResult::Superseded,
            GenerationOutcome::PendingConfirmation => GenerateResult::PendingConfirmation,
        }
    }
}

/// One editing session over one draft.
pub struct EditorSession {
    store: DraftStore,
    history: HistoryManager,
    arbiter: GenerationArbiter,
}

impl EditorSession {
    /// Starts a session with a fresh draft.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            store: DraftStore::new(category),
            history: HistoryManager::new(),
            arbiter: GenerationArbiter::new(),
        }
    }

    /// Starts a session rehydrated from a persisted in-progress draft.
    pub fn from_draft(draft: Draft) -> Self {
        Self {
            store: DraftStore::from_draft(draft),
            history: HistoryManager::new(),
            arbiter: GenerationArbiter::new(),
        }
    }

    /// Read-only access to the draft store.
    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    /// Read-only access to the history manager.
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Read-only access to the generation arbiter.
    pub fn arbiter(&self) -> &GenerationArbiter {
        &self.arbiter
    }

    /// The current draft.
    pub fn draft(&self) -> &Draft {
        self.store.draft()
    }

    // =========================================================================
    // EDITING PHASE
    // =========================================================================

    /// Enters the editing phase: seeds history with the current state and
    /// starts recording commit boundaries.
    pub fn begin_editing(&mut self) {
        self.history.init_from_state(&self.store.content());
        self.history.start_listening();
    }

    /// Leaves the editing phase; commit boundaries stop recording.
    pub fn end_editing(&mut self) {
        self.history.stop_listening();
    }

    /// Runs one user-edit batch against the store and closes it with one
    /// history record at the commit boundary.
    pub fn edit<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut DraftStore) -> R,
    {
        let result = f(&mut self.store);
        self.history.record(&self.store.content());
        result
    }

    /// Undoes one edit batch. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.store)
    }

    /// Redoes one undone edit batch. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.store)
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Generates a complete post and reconciles the response.
    ///
    /// On an unconflicted apply the history stack is re-seeded from the
    /// generated content, so the first undo cannot erase it.
    pub async fn generate_post(
        &mut self,
        service: &(impl GenerationService + Sync),
        slide_count: usize,
    ) -> DraftResult<GenerateResult> {
        let target = GenerationTarget::Full;
        let Some(ticket) = self.arbiter.begin(target, &self.store)? else {
            return Ok(GenerateResult::Rejected);
        };

        let request = PostGenerationRequest::from_draft(self.store.draft(), slide_count);
        match service.generate_post(&request).await {
            Ok(post) => {
                let outcome = self
                    .history
                    .with_applying(|_| self.arbiter.resolve_full(ticket, post, &mut self.store))?;
                if outcome == GenerationOutcome::Applied {
                    self.history.init_from_state(&self.store.content());
                }
                Ok(outcome.into())
            }
            Err(error) => {
                self.arbiter.resolve_failure(ticket, &error);
                Ok(GenerateResult::Failed(error))
            }
        }
    }

    /// Regenerates a single field and reconciles the response.
    ///
    /// An applied regeneration is recorded as one ordinary snapshot, so it
    /// is undoable like a manual edit.
    pub async fn generate_field(
        &mut self,
        service: &(impl GenerationService + Sync),
        field: RegenField,
        slide_index: Option<usize>,
    ) -> DraftResult<GenerateResult> {
        let target = GenerationTarget::field(field, slide_index);
        let Some(ticket) = self.arbiter.begin(target, &self.store)? else {
            return Ok(GenerateResult::Rejected);
        };

        let request = FieldGenerationRequest::from_draft(self.store.draft(), field, slide_index);
        match service.generate_field(&request).await {
            Ok(response) => {
                let outcome = self.history.with_applying(|_| {
                    self.arbiter
                        .resolve_field(ticket, response.value, &mut self.store)
                })?;
                if outcome == GenerationOutcome::Applied {
                    self.history.record(&self.store.content());
                }
                Ok(outcome.into())
            }
            Err(error) => {
                self.arbiter.resolve_failure(ticket, &error);
                Ok(GenerateResult::Failed(error))
            }
        }
    }

    /// Applies the parked pending generation result. Returns whether one
    /// existed.
    pub fn accept_pending(&mut self) -> DraftResult<bool> {
        let applied = self
            .history
            .with_applying(|_| self.arbiter.accept_pending(&mut self.store))?;
        if applied.is_some() {
            self.history.record(&self.store.content());
        }
        Ok(applied.is_some())
    }

    /// Discards the parked pending generation result, keeping the manual
    /// edit. Returns whether one existed.
    pub fn dismiss_pending(&mut self) -> bool {
        self.arbiter.dismiss_pending()
    }

    /// Target of the last offline failure, for a retry affordance.
    pub fn retry_target(&self) -> Option<GenerationTarget> {
        self.arbiter.retry_target()
    }

    // =========================================================================
    // EXPORT / LIFECYCLE
    // =========================================================================

    /// Exports the draft through the orchestrator and clears the dirty flag
    /// on success.
    pub async fn export<P: PersistService + Sync>(
        &mut self,
        orchestrator: &ExportOrchestrator<P>,
        job: &ExportJob,
    ) -> DraftResult<ExportOutcome> {
        let outcome = orchestrator.export_draft(self.store.draft(), job).await?;
        self.store.mark_saved();
        Ok(outcome)
    }

    /// Discards the session state and starts over with a fresh draft.
    pub fn reset(&mut self, category: impl Into<String>) {
        debug!("resetting editor session");
        self.store = DraftStore::new(category);
        self.history = HistoryManager::new();
        self.arbiter = GenerationArbiter::new();
    }

    /// The editable content subset (convenience for persistence of
    /// in-progress work).
    pub fn content(&self) -> DraftContent {
        self.store.content()
    }
}

// =============================================================================
// TESTS
// =============================================================================
