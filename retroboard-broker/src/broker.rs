//! Envelope-level broker over a raw [`PubSub`] transport.

use crate::bus::PubSub;
use crate::error::BrokerResult;
use crate::message::Envelope;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const SUBSCRIPTION_BUFFER: usize = 16;

/// Publishes and subscribes [`Envelope`]s on named channels.
#[derive(Clone)]
pub struct Broker<P> {
    bus: P,
}

impl<P: PubSub> Broker<P> {
    pub fn new(bus: P) -> Self {
        Self { bus }
    }

    /// Publishes an envelope on a channel.
    pub async fn publish(&self, channel: &str, envelope: &Envelope) -> BrokerResult<()> {
        let payload = serde_json::to_vec(envelope)?;
        self.bus.publish(channel, payload).await
    }

    /// Subscribes to a channel, decoding envelopes onto the returned
    /// receiver until the token is cancelled or the bus stream ends.
    ///
    /// The subscription is live before this returns, so no envelope
    /// published afterwards can be missed. Undecodable payloads are skipped.
    pub async fn subscribe(
        &self,
        token: CancellationToken,
        channel: &str,
    ) -> BrokerResult<mpsc::Receiver<Envelope>> {
        let mut stream = self.bus.subscribe(channel).await?;
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let channel = channel.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    payload = stream.next() => {
                        let Some(payload) = payload else { break };

                        let envelope = match serde_json::from_slice::<Envelope>(&payload) {
                            Ok(envelope) => envelope,
                            Err(err) => {
                                warn!(%channel, %err, "skipping undecodable bus payload");
                                continue;
                            }
                        };

                        tokio::select! {
                            _ = token.cancelled() => break,
                            sent = tx.send(envelope) => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }

            debug!(%channel, "subscription released");
        });

        Ok(rx)
    }
}
