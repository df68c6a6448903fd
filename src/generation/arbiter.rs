//! GenerationArbiter implementation: reconciles asynchronous generation
//! responses against concurrent manual edits.
//!
//! Every request is tagged with a monotonically increasing sequence number.
//! Only the most recently issued request's result is ever eligible to apply;
//! earlier in-flight results are discarded on arrival regardless of
//! completion order. A result that would overwrite a concurrent manual edit
//! is never applied silently: it is parked as a single pending value
//! awaiting explicit accept/dismiss.

use std::collections::HashSet;

use tracing::debug;

use crate::draft::{DraftContent, DraftStore};
use crate::error::DraftResult;
use crate::generation::model::{GeneratedPost, GenerationError, GenerationTarget};

/// Ephemeral handle for one in-flight generation request.
///
/// Lives only for the duration of one async call: issued by [`begin`],
/// consumed by `resolve_*` or [`resolve_failure`].
///
/// [`begin`]: GenerationArbiter::begin
/// [`resolve_failure`]: GenerationArbiter::resolve_failure
#[derive(Debug)]
pub struct GenerationTicket {
    sequence_id: u64,
    target: GenerationTarget,
    snapshot_before: serde_json::Value,
}

impl GenerationTicket {
    /// The sequence number issued to this request.
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// The target this request affects.
    pub fn target(&self) -> GenerationTarget {
        self.target
    }
}

/// A generated value parked for explicit user confirmation after a
/// reconciliation conflict. Exactly one may exist at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGeneration {
    pub target: GenerationTarget,
    pub payload: PendingPayload,
}

/// Payload of a pending generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingPayload {
    /// Full replacement content.
    Full(DraftContent),
    /// Single field value.
    Field(String),
}

/// Outcome of resolving a successful generation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The result was applied to the draft store immediately.
    Applied,
    /// A newer request superseded this one; the result was discarded.
    Superseded,
    /// The user edited the affected subset while the request was in flight;
    /// the result is parked as the pending value.
    PendingConfirmation,
}

/// Issues generation requests and reconciles their late responses.
pub struct GenerationArbiter {
    counter: u64,
    in_flight: HashSet<GenerationTarget>,
    pending: Option<PendingGeneration>,
    /// Target of the last offline failure, kept for the retry affordance.
    retry_target: Option<GenerationTarget>,
}

impl GenerationArbiter {
    /// Creates a new arbiter with no requests issued.
    pub fn new() -> Self {
        Self {
            counter: 0,
            in_flight: HashSet::new(),
            pending: None,
            retry_target: None,
        }
    }

    /// The most recently issued sequence number.
    pub fn sequence(&self) -> u64 {
        self.counter
    }

    /// True if a request for the given target is currently in flight.
    pub fn is_in_flight(&self, target: GenerationTarget) -> bool {
        self.in_flight.contains(&target)
    }

    /// The currently parked pending result, if any.
    pub fn pending(&self) -> Option<&PendingGeneration> {
        self.pending.as_ref()
    }

    /// Target of the last offline failure, for a retry affordance.
    pub fn retry_target(&self) -> Option<GenerationTarget> {
        self.retry_target
    }

    // =========================================================================
    // REQUEST LIFECYCLE
    // =========================================================================

    /// Starts a generation request against the given target.
    ///
    /// Returns `None` when a request for the same target is already in
    /// flight: rapid repeated invocations are rejected as no-ops. Otherwise
    /// allocates the next sequence number and captures `snapshot_before` —
    /// the serialized subset of the draft the request will affect (all
    /// slides for full generation, the single field otherwise).
    pub fn begin(
        &mut self,
        target: GenerationTarget,
        store: &DraftStore,
    ) -> DraftResult<Option<GenerationTicket>> {
        if self.in_flight.contains(&target) {
            debug!(generation = %target, "generation already in flight, rejecting duplicate");
            return Ok(None);
        }
        let snapshot_before = affected_subset(target, store)?;
        self.counter += 1;
        self.in_flight.insert(target);
        Ok(Some(GenerationTicket {
            sequence_id: self.counter,
            target,
            snapshot_before,
        }))
    }

    /// Resolves a successful full-generation response.
    pub fn resolve_full(
        &mut self,
        ticket: GenerationTicket,
        post: GeneratedPost,
        store: &mut DraftStore,
    ) -> DraftResult<GenerationOutcome> {
        self.in_flight.remove(&ticket.target);
        if self.is_stale(&ticket) {
            return Ok(GenerationOutcome::Superseded);
        }

        let current = affected_subset(ticket.target, store)?;
        if current != ticket.snapshot_before {
            self.park_pending(ticket.target, PendingPayload::Full(post.into_content()));
            return Ok(GenerationOutcome::PendingConfirmation);
        }

        store.replace_content(post.into_content());
        // A full replacement invalidates any undecided pending value.
        self.pending = None;
        Ok(GenerationOutcome::Applied)
    }

    /// Resolves a successful field-regeneration response.
    pub fn resolve_field(
        &mut self,
        ticket: GenerationTicket,
        value: String,
        store: &mut DraftStore,
    ) -> DraftResult<GenerationOutcome> {
        self.in_flight.remove(&ticket.target);
        if self.is_stale(&ticket) {
            return Ok(GenerationOutcome::Superseded);
        }

        let current = affected_subset(ticket.target, store)?;
        if current != ticket.snapshot_before {
            self.park_pending(ticket.target, PendingPayload::Field(value));
            return Ok(GenerationOutcome::PendingConfirmation);
        }

        match ticket.target {
            GenerationTarget::Field { field, slide_index } => {
                field.apply(store, slide_index, value)?;
            }
            GenerationTarget::Full => {
                return Err(crate::error::DraftError::validation(
                    "full-generation ticket resolved as a field response",
                ))
            }
        }
        // An applied regeneration clears a stale pending value for the
        // same field.
        if self.pending.as_ref().map(|p| p.target) == Some(ticket.target) {
            self.pending = None;
        }
        Ok(GenerationOutcome::Applied)
    }

    /// Records a failed request: releases the in-flight slot and, for
    /// offline failures, remembers the target so a retry can be offered.
    pub fn resolve_failure(&mut self, ticket: GenerationTicket, error: &GenerationError) {
        self.in_flight.remove(&ticket.target);
        if matches!(error, GenerationError::Offline) {
            self.retry_target = Some(ticket.target);
        }
        debug!(generation = %ticket.target, %error, "generation request failed");
    }

    // =========================================================================
    // PENDING CONFIRMATION
    // =========================================================================

    /// Applies the parked pending value to the store and clears it.
    ///
    /// Returns the target it affected, or `None` if nothing was pending.
    pub fn accept_pending(&mut self, store: &mut DraftStore) -> DraftResult<Option<GenerationTarget>> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        match (&pending.payload, pending.target) {
            (PendingPayload::Full(content), _) => store.replace_content(content.clone()),
            (PendingPayload::Field(value), GenerationTarget::Field { field, slide_index }) => {
                field.apply(store, slide_index, value.clone())?;
            }
            // A field payload is only ever parked for a field target.
            (PendingPayload::Field(_), GenerationTarget::Full) => {}
        }
        Ok(Some(pending.target))
    }

    /// Discards the parked pending value, keeping the manual edit.
    ///
    /// Returns whether a pending value existed.
    pub fn dismiss_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    fn is_stale(&self, ticket: &GenerationTicket) -> bool {
        if ticket.sequence_id != self.counter {
            debug!(
                sequence = ticket.sequence_id,
                newest = self.counter,
                "discarding superseded generation response"
            );
            return true;
        }
        false
    }

    fn park_pending(&mut self, target: GenerationTarget, payload: PendingPayload) {
        if self.pending.is_some() {
            debug!(generation = %target, "pending generation superseded by newer result");
        }
        self.pending = Some(PendingGeneration { target, payload });
    }
}

impl Default for GenerationArbiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes the subset of the draft a target affects.
///
/// Full generation snapshots the entire slide array; field regeneration
/// snapshots only the targeted field value.
fn affected_subset(target: GenerationTarget, store: &DraftStore) -> DraftResult<serde_json::Value> {
    match target {
        GenerationTarget::Full => Ok(serde_json::to_value(&store.draft().content.slides)?),
        GenerationTarget::Field { field, slide_index } => {
            field.current_value(store.draft(), slide_index)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
