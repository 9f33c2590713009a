//! Board persistence over a watched key-value backend.
//!
//! All mutation of a room's board funnels through [`StateStore::commit`]:
//! read the stored board under a watch, reconcile it with the incoming
//! snapshot, and write the result back — retrying on conflict, so racing
//! writers serialize through the backend rather than through any in-process
//! registry.

use crate::error::{StoreError, StoreResult};
use crate::kv::{Commit, Kv};
use retroboard_data::State;
use retroboard_merge::merge;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

const STATE_PREFIX: &str = "state";
const PASSWORD_PREFIX: &str = "password";

/// Retry budget for the optimistic-lock loop. Contention is bursty and each
/// attempt is cheap; saturating this bound indicates pathological contention
/// worth surfacing.
pub const MAX_COMMIT_RETRIES: u32 = 10_000;

/// Durable home of every room's board, plus the room password hashes.
pub struct StateStore<K> {
    kv: K,
    retries: AtomicU64,
}

impl<K: Kv> StateStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            retries: AtomicU64::new(0),
        }
    }

    /// Reads the current board for a room. `None` when the room has not
    /// received its first update yet.
    pub async fn state(&self, room_id: &str) -> StoreResult<Option<State>> {
        let key = key_for(STATE_PREFIX, room_id);

        match self.kv.get(&key).await? {
            None => Ok(None),
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        }
    }

    /// Reconciles and persists an incoming snapshot, returning the merged
    /// board as written.
    ///
    /// Only a watch conflict retries; a merge rejection or backend error
    /// surfaces immediately. The cumulative conflict count is readable via
    /// [`StateStore::retries`].
    pub async fn commit(&self, incoming: &State) -> StoreResult<State> {
        let key = key_for(STATE_PREFIX, &incoming.room_id);

        for attempt in 0..MAX_COMMIT_RETRIES {
            let mut txn = self.kv.begin(&key).await?;

            let merged = match txn.read().await? {
                None => {
                    // First update seeds the board; the action hint is
                    // advisory and never persisted.
                    let mut seeded = incoming.clone();
                    seeded.action = None;
                    seeded
                }
                Some(bytes) => {
                    let old: State = serde_json::from_slice(&bytes)?;
                    merge(&old, incoming)?
                }
            };

            let payload = serde_json::to_vec(&merged)?;

            match txn.commit(payload).await? {
                Commit::Committed => {
                    if attempt > 0 {
                        debug!(room_id = %incoming.room_id, attempt, "commit succeeded after conflicts");
                    }
                    return Ok(merged);
                }
                Commit::Conflict => {
                    self.retries.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        warn!(
            room_id = %incoming.room_id,
            budget = MAX_COMMIT_RETRIES,
            "commit retry budget exhausted"
        );

        Err(StoreError::RetriesExhausted(MAX_COMMIT_RETRIES))
    }

    /// Cumulative watch conflicts across all commits. Exposed as a cheap
    /// contention metric.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Stores a room's password hash, failing when the room already exists.
    pub async fn store_hashed_password(&self, room_id: &str, hash: &str) -> StoreResult<()> {
        let key = key_for(PASSWORD_PREFIX, room_id);

        if !self.kv.set_nx(&key, hash.as_bytes().to_vec(), None).await? {
            return Err(StoreError::AlreadyExists(format!("room '{room_id}'")));
        }

        Ok(())
    }

    /// Reads a room's password hash, failing when the room is unknown.
    pub async fn hashed_password(&self, room_id: &str) -> StoreResult<String> {
        let key = key_for(PASSWORD_PREFIX, room_id);

        match self.kv.get(&key).await? {
            None => Err(StoreError::DoesNotExist(format!("room '{room_id}'"))),
            Some(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

fn key_for(prefix: &str, room_id: &str) -> String {
    format!("{prefix}{room_id}")
}
