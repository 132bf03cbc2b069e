//! Price feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("generic price feed error: HTTP client error: {0}")]
    HttpClient(String),

    #[error("generic price feed error: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("generic price feed error: path '{0}' not found in response")]
    PathNotFound(String),

    #[error("generic price feed error: value at '{path}' is not a price: {value}")]
    NotAPrice { path: String, value: String },

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid rate offset: {0}")]
    InvalidOffset(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
