use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, error, warn};

use crate::config::FeedConfig;
use crate::error::TransportStatus;
use crate::feed::FeedPayload;

const USER_AGENT: &str = concat!("instafeed/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(FeedPayload),
    /// Upstream answered but had nothing to show. Never retried.
    EmptyResponse,
    TransportFailure(TransportStatus),
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str, max_tries: u32) -> FetchOutcome;
}

/// Delay between attempts: `base * 2^(attempt-1)`, capped. A zero base retries immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl RetryBackoff {
    pub const NONE: RetryBackoff = RetryBackoff {
        base: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.base.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    backoff: RetryBackoff,
}

enum Attempt {
    Done(FetchOutcome),
    Failed { status: Option<u16>, message: String },
}

impl HttpFetcher {
    pub fn new(client: Client, backoff: RetryBackoff) -> Self {
        Self { client, backoff }
    }

    /// Builds a client with the configured per-attempt timeout.
    pub fn from_config(config: &FeedConfig) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::new(client, config.retry_backoff()))
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                return Attempt::Failed {
                    status: err.status().map(|s| s.as_u16()),
                    message: err.to_string(),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Attempt::Failed {
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("unexpected status").to_owned(),
            };
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                return Attempt::Failed {
                    status: Some(status.as_u16()),
                    message: err.to_string(),
                }
            }
        };
        classify_body(status.as_u16(), &body)
    }
}

fn classify_body(status: u16, body: &[u8]) -> Attempt {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Attempt::Done(FetchOutcome::EmptyResponse);
    }

    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            return Attempt::Failed {
                status: Some(status),
                message: format!("malformed response body: {err}"),
            }
        }
    };
    if matches!(value, serde_json::Value::Null | serde_json::Value::Bool(false)) {
        return Attempt::Done(FetchOutcome::EmptyResponse);
    }

    match serde_json::from_value::<FeedPayload>(value) {
        Ok(payload) if payload.is_empty() => Attempt::Done(FetchOutcome::EmptyResponse),
        Ok(payload) => Attempt::Done(FetchOutcome::Success(payload)),
        Err(err) => Attempt::Failed {
            status: Some(status),
            message: format!("unexpected response shape: {err}"),
        },
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, max_tries: u32) -> FetchOutcome {
        let max_tries = max_tries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(url).await {
                Attempt::Done(outcome) => {
                    debug!(attempt, "feed request finished");
                    return outcome;
                }
                Attempt::Failed { status, message } => {
                    let tries_left = max_tries - attempt;
                    if tries_left == 0 {
                        error!(attempt, ?status, %message, "feed request failed; no tries left");
                        return FetchOutcome::TransportFailure(TransportStatus {
                            status,
                            message,
                            attempts: attempt,
                        });
                    }

                    warn!(attempt, tries_left, ?status, %message, "feed request failed; retrying");
                    let delay = self.backoff.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
