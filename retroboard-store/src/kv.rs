//! Key-value abstraction with watch-based optimistic locking.
//!
//! The store only needs three primitives from its backend: a plain read, a
//! set-if-absent, and a watched transaction whose commit fails when the key
//! changed after [`Kv::begin`]. [`MemoryKv`] implements the same contract on
//! a versioned map and backs the tests.

use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Outcome of a watched commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The value was written.
    Committed,
    /// The key changed since the watch began; nothing was written.
    Conflict,
}

/// Backend contract for the durable store.
#[async_trait]
pub trait Kv: Send + Sync + 'static {
    /// Reads a key.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes a key only when absent. Returns whether the write happened.
    async fn set_nx(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> StoreResult<bool>;

    /// Starts watching a key for a read-merge-write round trip.
    async fn begin(&self, key: &str) -> StoreResult<Box<dyn KvTxn>>;
}

/// A single optimistic-lock attempt over one key.
#[async_trait]
pub trait KvTxn: Send {
    /// Reads the watched key.
    async fn read(&mut self) -> StoreResult<Option<Vec<u8>>>;

    /// Writes the watched key, failing with [`Commit::Conflict`] when the
    /// key changed since the watch began.
    async fn commit(self: Box<Self>, value: Vec<u8>) -> StoreResult<Commit>;
}

/// In-memory [`Kv`] keeping a version counter per key.
///
/// Conflict detection compares the version captured at [`Kv::begin`] with
/// the version at commit, which is exactly the window a Redis `WATCH`
/// covers.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, (u64, Vec<u8>)>>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a key unconditionally, bumping its version. Test hook for
    /// simulating a rival writer.
    pub async fn put(&self, key: &str, value: Vec<u8>) {
        let mut entries = self.entries.lock().await;
        let version = entries.get(key).map(|(v, _)| *v).unwrap_or(0);
        entries.insert(key.to_string(), (version + 1, value));
    }
}

#[async_trait]
impl Kv for MemoryKv {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).map(|(_, value)| value.clone()))
    }

    async fn set_nx(
        &self,
        key: &str,
        value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;

        if entries.contains_key(key) {
            return Ok(false);
        }

        entries.insert(key.to_string(), (1, value));
        Ok(true)
    }

    async fn begin(&self, key: &str) -> StoreResult<Box<dyn KvTxn>> {
        let entries = self.entries.lock().await;
        let watched = entries.get(key).map(|(v, _)| *v).unwrap_or(0);

        Ok(Box::new(MemoryTxn {
            entries: Arc::clone(&self.entries),
            key: key.to_string(),
            watched,
        }))
    }
}

struct MemoryTxn {
    entries: Arc<Mutex<HashMap<String, (u64, Vec<u8>)>>>,
    key: String,
    watched: u64,
}

#[async_trait]
impl KvTxn for MemoryTxn {
    async fn read(&mut self) -> StoreResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&self.key).map(|(_, value)| value.clone()))
    }

    async fn commit(self: Box<Self>, value: Vec<u8>) -> StoreResult<Commit> {
        let mut entries = self.entries.lock().await;
        let current = entries.get(&self.key).map(|(v, _)| *v).unwrap_or(0);

        if current != self.watched {
            return Ok(Commit::Conflict);
        }

        entries.insert(self.key.clone(), (current + 1, value));
        Ok(Commit::Committed)
    }
}
