//! Non-blocking hand-off of accepted updates to the persistence channel.
//!
//! Sessions must not stall on the cross-process queue, so [`enqueue`] only
//! pushes onto an in-process channel; a background flusher republishes each
//! envelope on the configured bus channel for the merge workers to drain.
//!
//! [`enqueue`]: QueueProducer::enqueue

use crate::broker::Broker;
use crate::bus::PubSub;
use crate::error::{BrokerError, BrokerResult};
use crate::message::Envelope;
use tokio::sync::mpsc;
use tracing::warn;

/// Producer half of the persistence queue.
pub struct QueueProducer {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl QueueProducer {
    /// Spawns the flusher publishing onto `channel` through `broker`.
    pub fn new<P: PubSub>(broker: Broker<P>, channel: impl Into<String>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let channel = channel.into();

        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                if let Err(err) = broker.publish(&channel, &envelope).await {
                    warn!(%channel, %err, "dropping update the queue could not publish");
                }
            }
        });

        Self { tx }
    }

    /// Submits an update for persistence without blocking.
    pub fn enqueue(&self, envelope: Envelope) -> BrokerResult<()> {
        self.tx
            .send(envelope)
            .map_err(|_| BrokerError::ChannelClosed)
    }
}
