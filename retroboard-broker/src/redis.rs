//! Redis implementation of the [`PubSub`] contract.

use crate::bus::{PubSub, Subscription};
use crate::error::BrokerResult;
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Redis-backed pub/sub transport.
#[derive(Clone)]
pub struct RedisPubSub {
    client: redis::Client,
    publisher: ConnectionManager,
}

impl RedisPubSub {
    /// Connects to the given Redis URL.
    pub async fn connect(url: &str) -> BrokerResult<Self> {
        let client = redis::Client::open(url)?;
        let publisher = ConnectionManager::new(client.clone()).await?;

        Ok(Self { client, publisher })
    }

    /// Round-trips a `PING` to verify the connection.
    pub async fn ping(&self) -> BrokerResult<()> {
        let mut conn = self.publisher.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> BrokerResult<()> {
        let mut conn = self.publisher.clone();
        let _receivers: i64 = conn.publish(channel, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> BrokerResult<Subscription> {
        // Each subscription holds its own connection; completing the
        // SUBSCRIBE round trip is the readiness signal. Dropping the stream
        // drops the connection and with it the server-side subscription.
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let stream = pubsub
            .into_on_message()
            .map(|msg| msg.get_payload_bytes().to_vec());

        Ok(stream.boxed())
    }
}
