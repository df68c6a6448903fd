//! DraftStore implementation: single source of truth for editable post content.
//!
//! The store is an explicitly passed, single-owner context object. Whole-state
//! replacement (used by undo/redo and accepted generation) is distinguishable
//! from incremental field edits via [`ChangeKind`], because the history
//! manager reacts differently to each.

use paste::paste;

use crate::draft::model::{Background, Draft, DraftContent, Platform, Slide};
use crate::error::{DraftError, DraftResult};

/// Kind of the most recent mutation applied to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// No mutation since construction or the last save.
    None,
    /// Incremental field-level edit.
    Edit,
    /// Wholesale content replacement (undo/redo, accepted generation).
    Replace,
}

/// Generates setter/getter pairs for the draft's flat text fields.
/// All setters follow the same path: assign, then mark the session dirty.
macro_rules! content_text_fields {
    ($($field:ident),+ $(,)?) => {
        paste! {
            $(
                /// Sets the field and marks the session dirty.
                pub fn [<set_ $field>](&mut self, value: impl Into<String>) {
                    self.draft.content.$field = value.into();
                    self.touch(ChangeKind::Edit);
                }

                /// Returns the current field value.
                pub fn $field(&self) -> &str {
                    &self.draft.content.$field
                }
            )+
        }
    };
}

/// The canonical, mutable in-memory representation of the post under
/// construction. Everything else reads or writes through this store.
pub struct DraftStore {
    draft: Draft,
    dirty: bool,
    last_change: ChangeKind,
}

impl DraftStore {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates a store around a fresh draft with a single empty slide.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            draft: Draft::new(category),
            dirty: false,
            last_change: ChangeKind::None,
        }
    }

    /// Rehydrates a store from a previously persisted draft.
    ///
    /// The ≥1 slide invariant is re-established if the stored draft carried
    /// an empty slide list.
    pub fn from_draft(mut draft: Draft) -> Self {
        if draft.content.slides.is_empty() {
            draft.content.slides.push(Slide::default());
        }
        Self {
            draft,
            dirty: false,
            last_change: ChangeKind::None,
        }
    }

    /// Returns the current draft (read-only).
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Returns a deep copy of the editable content subset.
    pub fn content(&self) -> DraftContent {
        self.draft.content.clone()
    }

    /// Kind of the most recent mutation.
    pub fn last_change(&self) -> ChangeKind {
        self.last_change
    }

    /// True if the draft has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn touch(&mut self, kind: ChangeKind) {
        self.dirty = true;
        self.last_change = kind;
    }

    // =========================================================================
    // FIELD MUTATORS
    // =========================================================================

    content_text_fields!(caption_a, caption_b, hashtags_a, hashtags_b, cta_text);

    /// Applies a closure to mutate draft metadata (category, tone, topic,
    /// platform selection, arc linkage) as one field-level edit.
    pub fn update_meta<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Draft),
    {
        f(&mut self.draft);
        self.touch(ChangeKind::Edit);
    }

    /// Adds a platform to the export selection.
    pub fn select_platform(&mut self, platform: Platform) {
        self.draft.selected_platforms.insert(platform);
        self.touch(ChangeKind::Edit);
    }

    /// Removes a platform from the export selection.
    pub fn deselect_platform(&mut self, platform: Platform) {
        self.draft.selected_platforms.remove(&platform);
        self.touch(ChangeKind::Edit);
    }

    // =========================================================================
    // SLIDE OPERATIONS
    // =========================================================================

    /// Returns the number of slides.
    pub fn slide_count(&self) -> usize {
        self.draft.content.slides.len()
    }

    /// Gets a slide by index.
    pub fn slide(&self, index: usize) -> DraftResult<&Slide> {
        self.draft
            .content
            .slides
            .get(index)
            .ok_or_else(|| DraftError::index_out_of_bounds(index, self.draft.content.slides.len()))
    }

    /// Applies a closure to mutate one slide as a field-level edit.
    pub fn update_slide<F>(&mut self, index: usize, f: F) -> DraftResult<()>
    where
        F: FnOnce(&mut Slide),
    {
        let len = self.draft.content.slides.len();
        let slide = self
            .draft
            .content
            .slides
            .get_mut(index)
            .ok_or_else(|| DraftError::index_out_of_bounds(index, len))?;
        f(slide);
        self.touch(ChangeKind::Edit);
        Ok(())
    }

    /// Sets a slide headline.
    pub fn set_headline(&mut self, index: usize, headline: impl Into<String>) -> DraftResult<()> {
        let headline = headline.into();
        self.update_slide(index, |slide| slide.headline = headline)
    }

    /// Sets a slide subheadline (None clears it).
    pub fn set_subheadline(&mut self, index: usize, value: Option<String>) -> DraftResult<()> {
        self.update_slide(index, |slide| slide.subheadline = value)
    }

    /// Sets a slide body text (None clears it).
    pub fn set_body_text(&mut self, index: usize, value: Option<String>) -> DraftResult<()> {
        self.update_slide(index, |slide| slide.body_text = value)
    }

    /// Sets a slide CTA text (None clears it).
    pub fn set_slide_cta(&mut self, index: usize, value: Option<String>) -> DraftResult<()> {
        self.update_slide(index, |slide| slide.cta_text = value)
    }

    /// Sets a slide background.
    pub fn set_background(&mut self, index: usize, background: Background) -> DraftResult<()> {
        self.update_slide(index, |slide| slide.background = background)
    }

    /// Appends a new slide.
    pub fn add_slide(&mut self, slide: Slide) {
        self.draft.content.slides.push(slide);
        self.touch(ChangeKind::Edit);
    }

    /// Removes a slide by index.
    ///
    /// Removing the last remaining slide is a no-op: a draft always retains
    /// at least one slide. Returns whether a slide was removed.
    pub fn remove_slide(&mut self, index: usize) -> DraftResult<bool> {
        let len = self.draft.content.slides.len();
        if index >= len {
            return Err(DraftError::index_out_of_bounds(index, len));
        }
        if len == 1 {
            return Ok(false);
        }
        self.draft.content.slides.remove(index);
        self.touch(ChangeKind::Edit);
        Ok(true)
    }

    /// Moves a slide from one position to another (reordering).
    ///
    /// Reordering touches slide identity, so every slide is assigned its
    /// `drag_id` here if it does not carry one yet.
    pub fn move_slide(&mut self, from: usize, to: usize) -> DraftResult<()> {
        let len = self.draft.content.slides.len();
        if from >= len {
            return Err(DraftError::index_out_of_bounds(from, len));
        }
        if to > len {
            return Err(DraftError::index_out_of_bounds(to, len));
        }
        self.ensure_drag_ids();
        if from != to {
            let slide = self.draft.content.slides.remove(from);
            let adjusted_to = if from < to { to - 1 } else { to };
            self.draft.content.slides.insert(adjusted_to, slide);
        }
        self.touch(ChangeKind::Edit);
        Ok(())
    }

    /// Assigns drag identity tokens to every slide that lacks one.
    pub fn ensure_drag_ids(&mut self) {
        for slide in &mut self.draft.content.slides {
            slide.ensure_drag_id();
        }
    }

    // =========================================================================
    // WHOLE-STATE REPLACEMENT
    // =========================================================================

    /// Replaces the entire editable content wholesale.
    ///
    /// Used by undo/redo replay and by an accepted generation result. The ≥1
    /// slide invariant is re-established, and replayed slides are assigned
    /// drag identities so a list-diffing UI can track them.
    pub fn replace_content(&mut self, mut content: DraftContent) {
        if content.slides.is_empty() {
            content.slides.push(Slide::default());
        }
        self.draft.content = content;
        self.ensure_drag_ids();
        self.touch(ChangeKind::Replace);
    }
}

// =============================================================================
// TESTS
// =============================================================================
