use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::feed::{FeedIdentity, FeedPayload};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: FeedPayload,
    pub stored_at: DateTime<Utc>,
}

/// TTL cache over a key/value store: one data slot and one time slot per feed.
///
/// Backend faults and unreadable slots are reported as misses, never as errors.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn with_ttl_minutes(backend: Arc<dyn KeyValueStore>, minutes: u64) -> Self {
        Self::new(backend, Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn read(&self, identity: &FeedIdentity, allow_stale: bool) -> Option<CacheEntry> {
        self.read_at(identity, allow_stale, Utc::now()).await
    }

    pub async fn read_at(
        &self,
        identity: &FeedIdentity,
        allow_stale: bool,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry> {
        if !allow_stale && !self.is_enabled() {
            return None;
        }

        let stored_at = self.stored_at(identity).await?;
        if !allow_stale && !self.is_fresh(stored_at, now) {
            debug!(feed = %identity, %stored_at, "cache entry expired");
            return None;
        }

        let raw = match self.backend.get(&identity.data_key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(feed = %identity, error = %err, "cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str::<FeedPayload>(&raw) {
            Ok(data) => Some(CacheEntry { data, stored_at }),
            Err(err) => {
                warn!(feed = %identity, error = %err, "cached payload is unreadable; treating as miss");
                None
            }
        }
    }

    pub async fn write(&self, identity: &FeedIdentity, payload: &FeedPayload) {
        self.write_at(identity, payload, Utc::now()).await
    }

    /// Replaces the entry for `identity`. No-op when the TTL is zero.
    pub async fn write_at(&self, identity: &FeedIdentity, payload: &FeedPayload, now: DateTime<Utc>) {
        if !self.is_enabled() {
            return;
        }

        let serialized = match serde_json::to_string(payload) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(feed = %identity, error = %err, "failed to serialize payload for cache");
                return;
            }
        };

        // storedAt never moves backwards, even if the clock does.
        let stamp = match self.stored_at(identity).await {
            Some(previous) if previous > now => previous,
            _ => now,
        };

        if let Err(err) = self.backend.set(&identity.data_key(), serialized).await {
            warn!(feed = %identity, error = %err, "failed to write cached payload");
            return;
        }
        if let Err(err) = self
            .backend
            .set(&identity.time_key(), stamp.timestamp_millis().to_string())
            .await
        {
            warn!(feed = %identity, error = %err, "failed to write cache timestamp");
            return;
        }
        debug!(feed = %identity, records = payload.data.len(), "cache entry written");
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        stored_at.timestamp_millis().saturating_add(ttl_ms) > now.timestamp_millis()
    }

    async fn stored_at(&self, identity: &FeedIdentity) -> Option<DateTime<Utc>> {
        let raw = match self.backend.get(&identity.time_key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(feed = %identity, "no cache entry");
                return None;
            }
            Err(err) => {
                warn!(feed = %identity, error = %err, "cache timestamp read failed; treating as miss");
                return None;
            }
        };
        let millis = match raw.trim().parse::<i64>() {
            Ok(millis) => millis,
            Err(_) => {
                warn!(feed = %identity, value = %raw, "cache timestamp is not a number; treating as miss");
                return None;
            }
        };
        Utc.timestamp_millis_opt(millis).single()
    }
}
