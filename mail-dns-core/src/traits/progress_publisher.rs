//! Real-time progress channel

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::error::CoreResult;
use crate::types::{progress_topic, ProgressEvent};

/// Publishes `{domainId, progress}` events on a per-domain topic
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &ProgressEvent) -> CoreResult<()>;
}

const DEFAULT_CAPACITY: usize = 32;

/// In-process publisher with one broadcast channel per topic
///
/// Publishing to a topic nobody subscribed to is a no-op; lagging
/// subscribers lose the oldest events.
pub struct BroadcastProgressPublisher {
    channels: RwLock<HashMap<String, broadcast::Sender<ProgressEvent>>>,
    capacity: usize,
}

impl BroadcastProgressPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to `domain-setup:<domain_id>`.
    pub async fn subscribe(&self, domain_id: &str) -> broadcast::Receiver<ProgressEvent> {
        let topic = progress_topic(domain_id);
        let mut channels = self.channels.write().await;
        channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of topics that currently have a channel.
    pub async fn topic_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for BroadcastProgressPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressPublisher for BroadcastProgressPublisher {
    async fn publish(&self, topic: &str, event: &ProgressEvent) -> CoreResult<()> {
        let mut channels = self.channels.write().await;
        let Some(sender) = channels.get(topic) else {
            return Ok(());
        };
        if sender.send(event.clone()).is_err() {
            // every receiver was dropped
            channels.remove(topic);
        }
        Ok(())
    }
}
