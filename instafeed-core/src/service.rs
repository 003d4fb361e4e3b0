use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::FeedConfig;
use crate::error::{ErrorReporter, FeedError, TracingReporter};
use crate::feed::FeedPayload;
use crate::fetcher::{FeedFetcher, FetchOutcome};
use crate::normalize::{normalize, NormalizedItem};
use crate::sink::{Delivery, FeedSink};

pub type ItemFilter = Arc<dyn Fn(&NormalizedItem) -> bool + Send + Sync>;

/// Where a resolved payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Cache,
    Network,
    /// Expired cache entry served because every fetch attempt failed.
    StaleCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedData {
    pub payload: FeedPayload,
    pub source: DataSource,
}

/// Resolves the current feed for one configured account.
///
/// Each call is independent; the cache is the only state carried between calls.
/// Concurrent calls for the same feed are not coalesced.
pub struct FeedService {
    config: FeedConfig,
    cache: CacheStore,
    fetcher: Arc<dyn FeedFetcher>,
    reporter: Arc<dyn ErrorReporter>,
    filter: Option<ItemFilter>,
    force_refresh: bool,
}

impl FeedService {
    pub fn new(config: FeedConfig, cache: CacheStore, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            config,
            cache,
            fetcher,
            reporter: Arc::new(TracingReporter),
            filter: None,
            force_refresh: false,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Always go to the network first. The cached entry stays in place as the
    /// stale fallback when every attempt fails.
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Cached payload if fresh, otherwise a fetch with stale-cache fallback.
    pub async fn get_data(&self) -> Result<FeedData, FeedError> {
        let identity = self.config.identity();

        if self.force_refresh {
            debug!(feed = %identity, "refresh requested; skipping fresh cache read");
        } else if let Some(entry) = self.cache.read(&identity, false).await {
            debug!(feed = %identity, stored_at = %entry.stored_at, "serving feed from cache");
            return Ok(FeedData {
                payload: entry.data,
                source: DataSource::Cache,
            });
        }

        let url = self.config.media_url();
        match self.fetcher.fetch(&url, self.config.effective_max_tries()).await {
            FetchOutcome::Success(payload) => {
                self.cache.write(&identity, &payload).await;
                Ok(FeedData {
                    payload,
                    source: DataSource::Network,
                })
            }
            FetchOutcome::EmptyResponse => Err(FeedError::EmptyFeed),
            FetchOutcome::TransportFailure(status) => {
                match self.cache.read(&identity, true).await {
                    Some(entry) => {
                        warn!(
                            feed = %identity,
                            stored_at = %entry.stored_at,
                            %status,
                            "fetch failed; serving stale cache"
                        );
                        Ok(FeedData {
                            payload: entry.data,
                            source: DataSource::StaleCache,
                        })
                    }
                    None => Err(FeedError::FetchFailed { status }),
                }
            }
        }
    }

    /// Validates, resolves, normalizes and hands the feed to every sink.
    ///
    /// Failures go to the error reporter and are also returned.
    pub async fn run(&self, sinks: &[&dyn FeedSink]) -> Result<Delivery, FeedError> {
        let result = self.resolve(sinks).await;
        if let Err(err) = &result {
            self.reporter.report(&err.to_string(), err.code());
        }
        result
    }

    async fn resolve(&self, sinks: &[&dyn FeedSink]) -> Result<Delivery, FeedError> {
        self.config.validate()?;
        if sinks.is_empty() {
            return Err(FeedError::NoOutputTarget);
        }

        let data = self.get_data().await?;
        let items = self.prepare_items(&data.payload);
        for sink in sinks {
            sink.deliver(&items, &data.payload);
        }
        info!(
            feed = %self.config.identity(),
            items = items.len(),
            source = ?data.source,
            "feed delivered"
        );
        Ok(Delivery {
            items,
            payload: data.payload,
        })
    }

    /// Normalized, renderable items after the filter and the item limit.
    pub fn prepare_items(&self, payload: &FeedPayload) -> Vec<NormalizedItem> {
        payload
            .data
            .iter()
            .map(normalize)
            .filter(|item| {
                if !item.is_renderable() {
                    debug!(id = ?item.id, media_type = ?item.raw.media_type, "skipping media without image");
                    return false;
                }
                self.filter.as_ref().map_or(true, |keep| keep(item))
            })
            .take(self.config.items)
            .collect()
    }
}
