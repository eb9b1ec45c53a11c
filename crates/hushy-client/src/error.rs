use thiserror::Error;

use hushy_shared::error::ValidationError;
use hushy_store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Invalid secret: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Message blocked by moderation: {}", terms.join(", "))]
    Moderated { terms: Vec<String> },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State lock poisoned")]
    StatePoisoned,
}

impl ClientError {
    /// Transport failures, 5xx and 429 are worth another attempt; anything
    /// else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
