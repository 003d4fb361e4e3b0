pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod normalize;
pub mod service;
pub mod sink;
pub mod store;

pub use cache::{CacheEntry, CacheStore};
pub use config::FeedConfig;
pub use error::{ErrorReporter, FeedError, StoreError, TracingReporter, TransportStatus};
pub use feed::{FeedIdentity, FeedPayload, Paging, RawMediaRecord};
pub use fetcher::{FeedFetcher, FetchOutcome, HttpFetcher, RetryBackoff};
pub use normalize::{extract_tags, normalize, MediaKind, NormalizedItem};
pub use service::{DataSource, FeedData, FeedService, ItemFilter};
pub use sink::{CollectingSink, Delivery, FeedSink, JsonLinesSink};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
