//! Pub/sub transport abstraction.
//!
//! The bus contract is deliberately small: publish raw bytes on a channel,
//! and subscribe to a channel such that the returned future resolves only
//! once the subscription is live — nothing published after the call returns
//! can be missed. [`MemoryBus`] provides the in-process double.

use crate::error::BrokerResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// A live subscription yielding raw payloads. Dropping the stream releases
/// the underlying subscription.
pub type Subscription = BoxStream<'static, Vec<u8>>;

/// Pub/sub transport contract.
#[async_trait]
pub trait PubSub: Send + Sync + 'static {
    /// Publishes a payload on a channel.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> BrokerResult<()>;

    /// Subscribes to a channel. Resolves once the subscription is
    /// acknowledged by the bus.
    async fn subscribe(&self, channel: &str) -> BrokerResult<Subscription>;
}

const MEMORY_CHANNEL_CAPACITY: usize = 64;

/// In-process [`PubSub`] over tokio broadcast channels.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
}

impl MemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(MEMORY_CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl PubSub for MemoryBus {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> BrokerResult<()> {
        // A publish with no subscribers is fine; it simply fans out to nobody.
        let _ = self.sender(channel).await.send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> BrokerResult<Subscription> {
        let rx = self.sender(channel).await.subscribe();

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => return Some((payload, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "memory bus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream.boxed())
    }
}
