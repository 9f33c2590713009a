//! Room fan-out and persistence queue for retroboard.
//!
//! Every room is a channel on a cross-process pub/sub bus. Sessions publish
//! each accepted update to the room's channel (fanning out to every live
//! session of that room, on any process) and enqueue it for persistence;
//! merge workers drain the persistence channel. Delivery is per-channel
//! FIFO at best and may duplicate — the merge is idempotent, so both are
//! tolerated.
//!
//! Payloads are [`Envelope`]s: the board plus a propagation header bag that
//! carries the originating request's `traceparent` across the bus.

mod broker;
mod bus;
mod error;
mod message;
mod queue;
mod redis;

pub use broker::Broker;
pub use bus::{MemoryBus, PubSub, Subscription};
pub use error::{BrokerError, BrokerResult};
pub use message::Envelope;
pub use queue::QueueProducer;
pub use self::redis::RedisPubSub;
