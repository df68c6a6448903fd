//! Persistence service boundary: wire payloads, the [`PersistService`]
//! trait, and its HTTP client implementation.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::draft::{Draft, Platform, Slide};
use crate::error::{DraftError, DraftResult};

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Create/update payload for one post record.
///
/// `slide_data` is the JSON-serialized slide array with `drag_id` stripped —
/// drag identity is a session-local token and is never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub title: String,
    pub status: String,
    pub tone: String,
    pub slide_data: String,
    pub caption_a: String,
    pub caption_b: String,
    pub hashtags_a: String,
    pub hashtags_b: String,
    pub cta_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
}

impl PostPayload {
    /// Builds the payload for one platform from the current draft.
    pub fn from_draft(draft: &Draft, platform: Platform) -> DraftResult<Self> {
        let slides: Vec<Slide> = draft
            .content
            .slides
            .iter()
            .map(Slide::without_drag_id)
            .collect();
        Ok(Self {
            category: draft.category.clone(),
            country: draft.country.clone(),
            platform,
            template_id: draft.template_id.clone(),
            title: draft.title.clone(),
            status: "draft".to_string(),
            tone: draft.tone.clone(),
            slide_data: serde_json::to_string(&slides)?,
            caption_a: draft.content.caption_a.clone(),
            caption_b: draft.content.caption_b.clone(),
            hashtags_a: draft.content.hashtags_a.clone(),
            hashtags_b: draft.content.hashtags_b.clone(),
            cta_text: draft.content.cta_text.clone(),
            arc_id: draft.arc.as_ref().map(|a| a.arc_id.clone()),
            episode_number: draft.arc.as_ref().map(|a| a.episode_number),
        })
    }
}

/// Multi-platform save: one logical content item, N platform variants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingSaveRequest {
    pub post_data: PostPayload,
    pub platforms: Vec<Platform>,
    /// Whether the backend should adapt wording per platform.
    pub adapt_content: bool,
    pub source_platform: Platform,
}

/// Persisted post record returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: String,
    pub platform: Platform,
}

/// Record of the export act itself; "saved" and "exported" are distinct
/// states the backend tracks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub post_id: String,
    pub platform: Platform,
    pub resolution: String,
    pub slide_count: usize,
}

/// Episode create-or-update for narrative-arc drafts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeUpsert {
    pub arc_id: String,
    pub episode_number: u32,
    pub post_id: String,
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// Backend persistence service, specified only at its boundary.
#[async_trait]
pub trait PersistService {
    /// Creates or updates a post record.
    async fn save_post(&self, payload: &PostPayload) -> DraftResult<PostRecord>;

    /// Persists one linked sibling post per platform.
    async fn save_sibling_posts(
        &self,
        request: &SiblingSaveRequest,
    ) -> DraftResult<Vec<PostRecord>>;

    /// Records the export act for an already-saved post.
    async fn record_export(&self, record: &ExportRecord) -> DraftResult<()>;

    /// Creates or updates the episode record for an arc-linked post.
    async fn upsert_episode(&self, episode: &EpisodeUpsert) -> DraftResult<()>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// API client for the persistence backend.
pub struct HttpPersistClient {
    client: Client,
    base_url: String,
}

impl HttpPersistClient {
    /// Creates a new client with the given base URL and auth token.
    pub fn new(base_url: &str, token: &str) -> DraftResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> DraftResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(DraftError::persistence(status, message));
        }

        Ok(resp.json().await?)
    }

    async fn post_json_unit(&self, path: &str, body: &(impl Serialize + Sync)) -> DraftResult<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(DraftError::persistence(status, message));
        }

        Ok(())
    }
}

#[async_trait]
impl PersistService for HttpPersistClient {
    /// POST /api/v1/posts - Create or update a post record.
    async fn save_post(&self, payload: &PostPayload) -> DraftResult<PostRecord> {
        self.post_json("/api/v1/posts", payload).await
    }

    /// POST /api/v1/posts/siblings - Save one post per platform.
    async fn save_sibling_posts(
        &self,
        request: &SiblingSaveRequest,
    ) -> DraftResult<Vec<PostRecord>> {
        self.post_json("/api/v1/posts/siblings", request).await
    }

    /// POST /api/v1/exports - Record an export act.
    async fn record_export(&self, record: &ExportRecord) -> DraftResult<()> {
        self.post_json_unit("/api/v1/exports", record).await
    }

    /// POST /api/v1/episodes - Create or update an episode record.
    async fn upsert_episode(&self, episode: &EpisodeUpsert) -> DraftResult<()> {
        self.post_json_unit("/api/v1/episodes", episode).await
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{ArcLink, DraftStore};

    #[test]
    fn test_payload_strips_drag_ids() {
        let mut store = DraftStore::new("fitness");
        store.add_slide(Slide::new("Second"));
        store.move_slide(0, 2).unwrap();

        let payload = PostPayload::from_draft(store.draft(), Platform::Feed).unwrap();
        assert!(!payload.slide_data.contains("dragId"));
        assert_eq!(payload.status, "draft");
    }

    #[test]
    fn test_payload_carries_arc_linkage() {
        let mut store = DraftStore::new("fitness");
        store.update_meta(|draft| draft.arc = Some(ArcLink::new("arc-9", 4)));

        let payload = PostPayload::from_draft(store.draft(), Platform::Story).unwrap();
        assert_eq!(payload.arc_id.as_deref(), Some("arc-9"));
        assert_eq!(payload.episode_number, Some(4));
    }

    #[test]
    fn test_payload_wire_shape() {
        let store = DraftStore::new("fitness");
        let payload = PostPayload::from_draft(store.draft(), Platform::Feed).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["platform"], "feed");
        assert_eq!(json["status"], "draft");
        assert!(json.get("slideData").is_some());
        assert!(json.get("arcId").is_none());
    }
}
