//! Data models for the generation protocol and its wire formats.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::{Draft, DraftContent, DraftStore, Platform, Slide};
use crate::error::{DraftError, DraftResult};

// =============================================================================
// REGENERABLE FIELDS
// =============================================================================

/// The closed set of regenerable draft fields.
///
/// Each variant carries its own getter/setter pair over the draft, so the
/// set of regenerable fields is exhaustively checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegenField {
    Headline,
    Subheadline,
    BodyText,
    SlideCta,
    CaptionA,
    CaptionB,
    HashtagsA,
    HashtagsB,
    CtaText,
}

impl RegenField {
    /// Stable wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenField::Headline => "headline",
            RegenField::Subheadline => "subheadline",
            RegenField::BodyText => "bodyText",
            RegenField::SlideCta => "slideCta",
            RegenField::CaptionA => "captionA",
            RegenField::CaptionB => "captionB",
            RegenField::HashtagsA => "hashtagsA",
            RegenField::HashtagsB => "hashtagsB",
            RegenField::CtaText => "ctaText",
        }
    }

    /// True if the field lives on a slide rather than on the draft root.
    pub fn is_slide_scoped(&self) -> bool {
        matches!(
            self,
            RegenField::Headline
                | RegenField::Subheadline
                | RegenField::BodyText
                | RegenField::SlideCta
        )
    }

    /// Serialized current value of the field, used as `snapshot_before` and
    /// for conflict comparison on resolution.
    pub fn current_value(
        &self,
        draft: &Draft,
        slide_index: Option<usize>,
    ) -> DraftResult<serde_json::Value> {
        let content = &draft.content;
        let value = match self {
            RegenField::Headline => serde_json::to_value(&slide_at(draft, slide_index)?.headline)?,
            RegenField::Subheadline => {
                serde_json::to_value(&slide_at(draft, slide_index)?.subheadline)?
            }
            RegenField::BodyText => serde_json::to_value(&slide_at(draft, slide_index)?.body_text)?,
            RegenField::SlideCta => serde_json::to_value(&slide_at(draft, slide_index)?.cta_text)?,
            RegenField::CaptionA => serde_json::to_value(&content.caption_a)?,
            RegenField::CaptionB => serde_json::to_value(&content.caption_b)?,
            RegenField::HashtagsA => serde_json::to_value(&content.hashtags_a)?,
            RegenField::HashtagsB => serde_json::to_value(&content.hashtags_b)?,
            RegenField::CtaText => serde_json::to_value(&content.cta_text)?,
        };
        Ok(value)
    }

    /// Writes a generated value into the store through the field's setter.
    pub fn apply(
        &self,
        store: &mut DraftStore,
        slide_index: Option<usize>,
        value: String,
    ) -> DraftResult<()> {
        match self {
            RegenField::Headline => store.set_headline(require_index(slide_index)?, value),
            RegenField::Subheadline => {
                store.set_subheadline(require_index(slide_index)?, Some(value))
            }
            RegenField::BodyText => store.set_body_text(require_index(slide_index)?, Some(value)),
            RegenField::SlideCta => store.set_slide_cta(require_index(slide_index)?, Some(value)),
            RegenField::CaptionA => {
                store.set_caption_a(value);
                Ok(())
            }
            RegenField::CaptionB => {
                store.set_caption_b(value);
                Ok(())
            }
            RegenField::HashtagsA => {
                store.set_hashtags_a(value);
                Ok(())
            }
            RegenField::HashtagsB => {
                store.set_hashtags_b(value);
                Ok(())
            }
            RegenField::CtaText => {
                store.set_cta_text(value);
                Ok(())
            }
        }
    }
}

fn require_index(slide_index: Option<usize>) -> DraftResult<usize> {
    slide_index.ok_or_else(|| DraftError::validation("slide index required for slide field"))
}

fn slide_at(draft: &Draft, slide_index: Option<usize>) -> DraftResult<&Slide> {
    let index = require_index(slide_index)?;
    draft
        .content
        .slides
        .get(index)
        .ok_or_else(|| DraftError::index_out_of_bounds(index, draft.content.slides.len()))
}

// =============================================================================
// GENERATION TARGET
// =============================================================================

/// What a generation request affects: the whole draft, or a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTarget {
    /// Full post generation replacing the whole editable content.
    Full,
    /// Regeneration of a single field, optionally scoped to a slide.
    Field {
        field: RegenField,
        slide_index: Option<usize>,
    },
}

impl GenerationTarget {
    /// Convenience constructor for a field target.
    pub fn field(field: RegenField, slide_index: Option<usize>) -> Self {
        GenerationTarget::Field { field, slide_index }
    }
}

impl std::fmt::Display for GenerationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationTarget::Full => write!(f, "full"),
            GenerationTarget::Field { field, slide_index } => match slide_index {
                Some(i) => write!(f, "{}[{}]", field.as_str(), i),
                None => write!(f, "{}", field.as_str()),
            },
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Request for a full post generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostGenerationRequest {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_points: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub platform: Platform,
    pub slide_count: usize,
    pub tone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl PostGenerationRequest {
    /// Builds a request from the current draft.
    pub fn from_draft(draft: &Draft, slide_count: usize) -> Self {
        Self {
            category: draft.category.clone(),
            topic: draft.topic.clone(),
            key_points: draft.key_points.clone(),
            country: draft.country.clone(),
            platform: draft.platform.unwrap_or(Platform::Feed),
            slide_count,
            tone: draft.tone.clone(),
            student_id: draft.student_id.clone(),
        }
    }
}

/// Full generation response: the complete editable content of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedPost {
    pub slides: Vec<Slide>,
    pub caption_a: String,
    pub caption_b: String,
    pub hashtags_a: String,
    pub hashtags_b: String,
    pub cta_text: String,
}

impl Default for GeneratedPost {
    fn default() -> Self {
        Self {
            slides: Vec::new(),
            caption_a: String::new(),
            caption_b: String::new(),
            hashtags_a: String::new(),
            hashtags_b: String::new(),
            cta_text: String::new(),
        }
    }
}

impl GeneratedPost {
    /// Converts the response into draft content for wholesale replacement.
    pub fn into_content(self) -> DraftContent {
        DraftContent {
            slides: self.slides,
            caption_a: self.caption_a,
            caption_b: self.caption_b,
            hashtags_a: self.hashtags_a,
            hashtags_b: self.hashtags_b,
            cta_text: self.cta_text,
        }
    }
}

/// Request for a single-field regeneration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGenerationRequest {
    pub field: RegenField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,
    pub category: String,
    pub tone: String,
    pub platform: Platform,
    /// Current value of the field, passed as generation context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
}

impl FieldGenerationRequest {
    /// Builds a field request from the current draft.
    pub fn from_draft(draft: &Draft, field: RegenField, slide_index: Option<usize>) -> Self {
        let current_value = field
            .current_value(draft, slide_index)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string));
        Self {
            field,
            slide_index,
            category: draft.category.clone(),
            tone: draft.tone.clone(),
            platform: draft.platform.unwrap_or(Platform::Feed),
            current_value,
        }
    }
}

/// Field regeneration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
}

// =============================================================================
// ERROR CLASSIFICATION
// =============================================================================

/// Classified generation-service failures.
///
/// Rate limits and offline transport errors are distinguished from generic
/// service failures so the UI can show the backoff message verbatim or offer
/// a retry action.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Service signalled backoff (HTTP 429). Shown verbatim to the user.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network unreachable; the last attempted action is remembered so a
    /// retry can be offered.
    #[error("Generation service unreachable")]
    Offline,

    /// Any other 4xx/5xx service failure.
    #[error("Generation service error: {status} - {message}")]
    Service { status: u16, message: String },

    /// Transport failure that is not an offline condition (e.g. timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Invalid generation payload: {0}")]
    Payload(String),
}

// =============================================================================
// TESTS
// =============================================================================
