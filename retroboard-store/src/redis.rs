//! Redis implementation of the [`Kv`] contract.
//!
//! Plain reads and set-if-absent go through a shared connection manager.
//! Watched transactions need `WATCH` state, which is per-connection in
//! Redis, so every [`Kv::begin`] opens a dedicated connection and runs
//! `WATCH` / `GET` / `MULTI`-`SET`-`EXEC` on it; an aborted `EXEC` (nil
//! response) surfaces as [`Commit::Conflict`].

use crate::error::StoreResult;
use crate::kv::{Commit, Kv, KvTxn};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed key-value store.
#[derive(Clone)]
pub struct RedisKv {
    client: redis::Client,
    manager: ConnectionManager,
}

impl RedisKv {
    /// Connects to the given Redis URL.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client.clone()).await?;

        Ok(Self { client, manager })
    }

    /// Round-trips a `PING` to verify the connection.
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl Kv for RedisKv {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_nx(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        let mut conn = self.manager.clone();

        let did_set = match ttl {
            None => conn.set_nx(key, value).await?,
            Some(ttl) => {
                let reply: Option<String> = redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("PX")
                    .arg(ttl.as_millis() as u64)
                    .query_async(&mut conn)
                    .await?;
                reply.is_some()
            }
        };

        Ok(did_set)
    }

    async fn begin(&self, key: &str) -> StoreResult<Box<dyn KvTxn>> {
        // Dedicated connection: WATCH state must not share a pipe with
        // unrelated commands.
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = redis::cmd("WATCH").arg(key).query_async(&mut conn).await?;

        Ok(Box::new(RedisTxn {
            conn,
            key: key.to_string(),
        }))
    }
}

struct RedisTxn {
    conn: MultiplexedConnection,
    key: String,
}

#[async_trait]
impl KvTxn for RedisTxn {
    async fn read(&mut self) -> StoreResult<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self.conn.get(&self.key).await?;
        Ok(value)
    }

    async fn commit(mut self: Box<Self>, value: Vec<u8>) -> StoreResult<Commit> {
        let reply: Option<()> = redis::pipe()
            .atomic()
            .set(&self.key, value)
            .ignore()
            .query_async(&mut self.conn)
            .await?;

        Ok(match reply {
            Some(()) => Commit::Committed,
            None => Commit::Conflict,
        })
    }
}
