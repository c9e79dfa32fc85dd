use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedditError>;

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited by Reddit (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl RedditError {
    /// Network failures and rate limits clear up on their own; the caller can
    /// simply try again on the next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            RedditError::Network(_) | RedditError::RateLimited { .. } => true,
            RedditError::Api { status, .. } => *status >= 500,
            RedditError::Auth(_) | RedditError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for RedditError {
    fn from(err: reqwest::Error) -> Self {
        RedditError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RedditError {
    fn from(err: serde_json::Error) -> Self {
        RedditError::Parse(err.to_string())
    }
}
