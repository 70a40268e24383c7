use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Exchange returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Rate limited by exchange (wait {0:?})")]
    RateLimited(Option<Duration>),
    #[error("Malformed payload: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScreenerError {
    /// Whether repeating the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::RateLimited(_) => true,
            _ => false,
        }
    }

    /// Minimum wait the exchange asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(wait) => *wait,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
