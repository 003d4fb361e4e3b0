use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FeedError;
use crate::feed::FeedIdentity;
use crate::fetcher::RetryBackoff;

pub const DEFAULT_HOST: &str = "https://graph.instagram.com/";

// The field list is part of the upstream contract; keep it verbatim.
const MEDIA_FIELDS: &str = "caption,id,media_type,media_url,permalink,thumbnail_url,timestamp,username";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub host: String,
    pub access_token: String,
    pub feed_id: String,
    pub max_tries: u32,
    pub cache_ttl_minutes: u64,
    pub items: usize,
    pub request_timeout_seconds: u64,
    pub retry_backoff_ms: u64,
    pub max_retry_backoff_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            access_token: String::new(),
            feed_id: String::new(),
            max_tries: 8,
            cache_ttl_minutes: 360,
            items: 8,
            request_timeout_seconds: 10,
            retry_backoff_ms: 0,
            max_retry_backoff_ms: 5_000,
        }
    }
}

impl FeedConfig {
    /// Reads a JSON config; unreadable files fall back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: FeedConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Writes pretty JSON through a temp file and rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if self.access_token.trim().is_empty() {
            return Err(FeedError::MissingAccessToken);
        }
        Ok(())
    }

    pub fn identity(&self) -> FeedIdentity {
        FeedIdentity::new(self.feed_id.clone())
    }

    pub fn media_url(&self) -> String {
        let slash = if self.host.ends_with('/') { "" } else { "/" };
        format!(
            "{}{}me/media?fields={}&access_token={}",
            self.host, slash, MEDIA_FIELDS, self.access_token
        )
    }

    pub fn effective_max_tries(&self) -> u32 {
        self.max_tries.max(1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> RetryBackoff {
        RetryBackoff {
            base: Duration::from_millis(self.retry_backoff_ms),
            max: Duration::from_millis(self.max_retry_backoff_ms),
        }
    }
}
