use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::feed::FeedPayload;
use crate::normalize::NormalizedItem;

/// Output target for a resolved feed: a renderer, a callback, a writer.
pub trait FeedSink: Send + Sync {
    fn deliver(&self, items: &[NormalizedItem], payload: &FeedPayload);
}

impl<F> FeedSink for F
where
    F: Fn(&[NormalizedItem], &FeedPayload) + Send + Sync,
{
    fn deliver(&self, items: &[NormalizedItem], payload: &FeedPayload) {
        self(items, payload)
    }
}

/// Writes one JSON object per item.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> FeedSink for JsonLinesSink<W> {
    fn deliver(&self, items: &[NormalizedItem], _payload: &FeedPayload) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        for item in items {
            let result = serde_json::to_writer(&mut *out, item)
                .map_err(std::io::Error::from)
                .and_then(|_| out.write_all(b"\n"));
            if let Err(e) = result {
                warn!(error = %e, "failed to write item");
                return;
            }
        }
        if let Err(e) = out.flush() {
            warn!(error = %e, "failed to flush item output");
        }
    }
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub items: Vec<NormalizedItem>,
    pub payload: FeedPayload,
}

/// Keeps every delivery in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        match self.deliveries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FeedSink for CollectingSink {
    fn deliver(&self, items: &[NormalizedItem], payload: &FeedPayload) {
        let delivery = Delivery {
            items: items.to_vec(),
            payload: payload.clone(),
        };
        match self.deliveries.lock() {
            Ok(mut guard) => guard.push(delivery),
            Err(poisoned) => poisoned.into_inner().push(delivery),
        }
    }
}
