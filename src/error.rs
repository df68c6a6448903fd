//! Error types for the post drafting and export core.

use thiserror::Error;

/// Result type alias for draft operations.
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors that can occur while drafting, rendering, or exporting a post.
#[derive(Error, Debug)]
pub enum DraftError {
    /// A required draft field is missing or invalid before an operation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Index out of bounds for slide list operations.
    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Background value could not be parsed (e.g. malformed hex colour).
    #[error("Invalid background value: {0}")]
    InvalidBackground(String),

    /// PNG encoding failed.
    #[error("PNG encoding error: {0}")]
    PngEncode(#[from] png::EncodingError),

    /// PNG decoding failed (fetched background image).
    #[error("PNG decoding error: {0}")]
    PngDecode(#[from] png::DecodingError),

    /// Archive assembly failed.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error while writing archive entries.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend persistence call failed.
    #[error("Persistence error: {status} - {message}")]
    Persistence { status: u16, message: String },

    /// Underlying HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid header value when constructing a client.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl DraftError {
    /// Creates a Validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an IndexOutOfBounds error.
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Creates an InvalidBackground error.
    pub fn invalid_background(value: impl Into<String>) -> Self {
        Self::InvalidBackground(value.into())
    }

    /// Creates a Persistence error.
    pub fn persistence(status: u16, message: impl Into<String>) -> Self {
        Self::Persistence {
            status,
            message: message.into(),
        }
    }
}
