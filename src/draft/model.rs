//! Data models for the post draft.
//!
//! A [`Draft`] is the single in-progress post of an editing session. Its
//! editable subset ([`DraftContent`]) is what the history manager snapshots
//! and what an accepted generation replaces wholesale.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// PLATFORM / QUALITY
// =============================================================================

/// Target platform for rendered artifacts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Square feed post.
    Feed,
    /// Vertical story.
    Story,
    /// Vertical short-video cover.
    Shorts,
}

impl Platform {
    /// All supported platforms, in canonical order.
    pub const ALL: [Platform; 3] = [Platform::Feed, Platform::Story, Platform::Shorts];

    /// Stable slug used in filenames and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Feed => "feed",
            Platform::Story => "story",
            Platform::Shorts => "shorts",
        }
    }
}

/// Export quality preset. Scales the base canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// 1080-based output (1x).
    Standard,
    /// 2160-based output (2x).
    High,
}

impl Quality {
    /// Integer scale factor applied to canvas dimensions and drawing.
    pub fn scale(&self) -> u32 {
        match self {
            Quality::Standard => 1,
            Quality::High => 2,
        }
    }

    /// Resolution label reported to the export-record endpoint.
    pub fn resolution_label(&self) -> &'static str {
        match self {
            Quality::Standard => "1080",
            Quality::High => "2160",
        }
    }
}

// =============================================================================
// BACKGROUND
// =============================================================================

/// Slide background: a flat colour or a referenced image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Background {
    /// Hex colour string, e.g. `"#1e293b"`.
    Color(String),
    /// Image URL; resolved by the export orchestrator before rendering.
    Image(String),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color("#1e293b".to_string())
    }
}

// =============================================================================
// SLIDE
// =============================================================================

/// One carousel page of a draft.
///
/// `drag_id` is a session-unique identity token assigned lazily the first
/// time a slide is touched by reordering or undo/redo replay, so a
/// list-diffing UI can track identity across mutation. It is never persisted
/// to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Slide {
    pub headline: String,
    pub subheadline: Option<String>,
    pub body_text: Option<String>,
    pub cta_text: Option<String>,
    pub background: Background,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag_id: Option<Uuid>,
}

impl Slide {
    /// Creates a new slide with the given headline.
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            ..Default::default()
        }
    }

    /// Builder: Set subheadline.
    pub fn with_subheadline(mut self, subheadline: impl Into<String>) -> Self {
        self.subheadline = Some(subheadline.into());
        self
    }

    /// Builder: Set body text.
    pub fn with_body_text(mut self, body_text: impl Into<String>) -> Self {
        self.body_text = Some(body_text.into());
        self
    }

    /// Builder: Set slide CTA text.
    pub fn with_cta_text(mut self, cta_text: impl Into<String>) -> Self {
        self.cta_text = Some(cta_text.into());
        self
    }

    /// Builder: Set background.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Ensures the slide carries a drag identity token, assigning one lazily.
    pub fn ensure_drag_id(&mut self) -> Uuid {
        *self.drag_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Returns a copy with `drag_id` stripped, for backend persistence.
    pub fn without_drag_id(&self) -> Slide {
        Slide {
            drag_id: None,
            ..self.clone()
        }
    }
}

// =============================================================================
// NARRATIVE ARC
// =============================================================================

/// Optional serialized-story linkage across multiple posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcLink {
    /// Identifier of the narrative arc this draft belongs to.
    pub arc_id: String,
    /// 1-based episode number within the arc.
    pub episode_number: u32,
    /// Recap block drawn on the first slide.
    pub recap: Option<String>,
    /// Cliffhanger block drawn on the last slide.
    pub cliffhanger: Option<String>,
    /// Next-episode hint drawn on the last slide.
    pub next_hint: Option<String>,
}

impl ArcLink {
    /// Creates a new arc link.
    pub fn new(arc_id: impl Into<String>, episode_number: u32) -> Self {
        Self {
            arc_id: arc_id.into(),
            episode_number,
            ..Default::default()
        }
    }

    /// Builder: Set recap text.
    pub fn with_recap(mut self, recap: impl Into<String>) -> Self {
        self.recap = Some(recap.into());
        self
    }

    /// Builder: Set cliffhanger text.
    pub fn with_cliffhanger(mut self, cliffhanger: impl Into<String>) -> Self {
        self.cliffhanger = Some(cliffhanger.into());
        self
    }

    /// Builder: Set next-episode hint.
    pub fn with_next_hint(mut self, next_hint: impl Into<String>) -> Self {
        self.next_hint = Some(next_hint.into());
        self
    }
}

// =============================================================================
// DRAFT CONTENT (editable subset)
// =============================================================================

/// The editable subset of a draft: what snapshots capture and what a full
/// generation replaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DraftContent {
    pub slides: Vec<Slide>,
    pub caption_a: String,
    pub caption_b: String,
    pub hashtags_a: String,
    pub hashtags_b: String,
    pub cta_text: String,
}

impl DraftContent {
    /// Returns the number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

// =============================================================================
// DRAFT
// =============================================================================

/// The in-progress post being authored. Exactly one per editing session,
/// owned exclusively by the [`DraftStore`](super::DraftStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Draft {
    /// Editable content subset.
    pub content: DraftContent,

    /// Content category (e.g. "fitness").
    pub category: String,
    /// Writing tone requested from the generation service.
    pub tone: String,
    /// Optional audience country.
    pub country: Option<String>,
    /// Optional topic for full generation.
    pub topic: Option<String>,
    /// Optional key points for full generation.
    pub key_points: Option<String>,
    /// Post title used by the persistence record.
    pub title: String,
    /// Optional template identifier.
    pub template_id: Option<String>,
    /// Optional student identifier forwarded to the generation service.
    pub student_id: Option<String>,

    /// Primary platform of the draft.
    pub platform: Option<Platform>,
    /// Platforms selected for export.
    pub selected_platforms: BTreeSet<Platform>,

    /// Narrative-arc linkage, when this draft is an episode.
    pub arc: Option<ArcLink>,
}

impl Draft {
    /// Creates a new draft with a single empty slide.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            content: DraftContent {
                slides: vec![Slide::default()],
                ..Default::default()
            },
            category: category.into(),
            ..Default::default()
        }
    }

    /// Builder: Set tone.
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// Builder: Set title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: Set primary platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Builder: Set arc linkage.
    pub fn with_arc(mut self, arc: ArcLink) -> Self {
        self.arc = Some(arc);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_has_one_slide() {
        let draft = Draft::new("fitness");
        assert_eq!(draft.content.slide_count(), 1);
        assert_eq!(draft.category, "fitness");
    }

    #[test]
    fn test_slide_builder() {
        let slide = Slide::new("Headline")
            .with_subheadline("Sub")
            .with_body_text("Body")
            .with_background(Background::Color("#ff0000".to_string()));

        assert_eq!(slide.headline, "Headline");
        assert_eq!(slide.subheadline.as_deref(), Some("Sub"));
        assert_eq!(slide.body_text.as_deref(), Some("Body"));
        assert!(slide.drag_id.is_none());
    }

    #[test]
    fn test_ensure_drag_id_is_stable() {
        let mut slide = Slide::new("Headline");
        let first = slide.ensure_drag_id();
        let second = slide.ensure_drag_id();
        assert_eq!(first, second);
    }

    #[test]
    fn test_without_drag_id_strips_token() {
        let mut slide = Slide::new("Headline");
        slide.ensure_drag_id();

        let stripped = slide.without_drag_id();
        assert!(stripped.drag_id.is_none());
        assert_eq!(stripped.headline, "Headline");

        let json = serde_json::to_value(&stripped).unwrap();
        assert!(json.get("dragId").is_none());
    }

    #[test]
    fn test_background_wire_shape() {
        let bg = Background::Image("https://example.com/bg.png".to_string());
        let json = serde_json::to_value(&bg).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["value"], "https://example.com/bg.png");
    }

    #[test]
    fn test_platform_slugs() {
        assert_eq!(Platform::Feed.as_str(), "feed");
        assert_eq!(Platform::Story.as_str(), "story");
        assert_eq!(Platform::Shorts.as_str(), "shorts");
    }

    #[test]
    fn test_quality_scale() {
        assert_eq!(Quality::Standard.scale(), 1);
        assert_eq!(Quality::High.scale(), 2);
        assert_eq!(Quality::High.resolution_label(), "2160");
    }
}
