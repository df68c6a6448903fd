//! Generation service boundary: the [`GenerationService`] trait and its
//! HTTP client implementation.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DraftResult;
use crate::generation::model::{
    FieldGenerationRequest, FieldValue, GeneratedPost, GenerationError, PostGenerationRequest,
};

/// External text/image generation service, specified only at its boundary.
#[async_trait]
pub trait GenerationService {
    /// Generates a complete post for the draft's category/topic/tone.
    async fn generate_post(
        &self,
        request: &PostGenerationRequest,
    ) -> Result<GeneratedPost, GenerationError>;

    /// Regenerates a single field.
    async fn generate_field(
        &self,
        request: &FieldGenerationRequest,
    ) -> Result<FieldValue, GenerationError>;
}

/// API client for the generation service.
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
}

impl HttpGenerationClient {
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
    ) -> Result<T, GenerationError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            // Backoff message is shown verbatim to the user.
            let message = resp.text().await.unwrap_or_default();
            return Err(GenerationError::RateLimited(message));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        resp.json()
            .await
            .map_err(|e| GenerationError::Payload(e.to_string()))
    }
}

#[async_trait]
impl GenerationService for HttpGenerationClient {
    /// POST /api/v1/generate/post - Generate a full post.
    async fn generate_post(
        &self,
        request: &PostGenerationRequest,
    ) -> Result<GeneratedPost, GenerationError> {
        self.post_json("/api/v1/generate/post", request).await
    }

    /// POST /api/v1/generate/field - Regenerate a single field.
    async fn generate_field(
        &self,
        request: &FieldGenerationRequest,
    ) -> Result<FieldValue, GenerationError> {
        self.post_json("/api/v1/generate/field", request).await
    }
}

/// Maps transport failures: unreachable network is distinguished from other
/// failures so the UI can offer a retry action.
fn classify_transport(error: reqwest::Error) -> GenerationError {
    if error.is_connect() {
        GenerationError::Offline
    } else {
        GenerationError::Http(error)
    }
}
