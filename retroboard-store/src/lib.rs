//! Durable store for retroboard.
//!
//! The authoritative copy of every room's board lives behind the [`Kv`]
//! contract: a read, a set-if-absent, and a watched transaction whose commit
//! fails when the key changed underneath it. [`StateStore`] builds the
//! optimistic-lock commit loop on top, using the merge engine to reconcile
//! each incoming snapshot with whatever is already stored.
//!
//! Two backends are provided: [`RedisKv`] for production and [`MemoryKv`]
//! for tests.

mod error;
mod kv;
mod redis;
mod state_store;

pub use error::{StoreError, StoreResult};
pub use kv::{Commit, Kv, KvTxn, MemoryKv};
pub use self::redis::RedisKv;
pub use state_store::{StateStore, MAX_COMMIT_RETRIES};
