use std::fmt;

use thiserror::Error;
use tracing::error;

/// Last transport failure seen by the fetcher, after retries ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportStatus {
    pub status: Option<u16>,
    pub message: String,
    pub attempts: u32,
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "status code {} ({})", code, self.message),
            None => write!(f, "no status code ({})", self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("access token needs to be set")]
    MissingAccessToken,
    #[error("neither an output target nor a callback is configured")]
    NoOutputTarget,
    #[error("the profile returned no media; it may be empty or age restricted")]
    EmptyFeed,
    #[error("unable to fetch the feed after {} attempt(s): upstream responded with {status}", .status.attempts)]
    FetchFailed { status: TransportStatus },
}

impl FeedError {
    /// Stable numeric code handed to the error channel. Never renumber.
    pub fn code(&self) -> u32 {
        match self {
            FeedError::MissingAccessToken => 1,
            FeedError::NoOutputTarget => 2,
            FeedError::EmptyFeed => 3,
            FeedError::FetchFailed { .. } => 5,
        }
    }
}

/// Faults of a key/value backend. These never leave the cache layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller-supplied channel for terminal failures.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, message: &str, code: u32);
}

/// Default reporter: emits the failure as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, message: &str, code: u32) {
        error!(code, "{}", message);
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&str, u32) + Send + Sync,
{
    fn report(&self, message: &str, code: u32) {
        self(message, code)
    }
}
