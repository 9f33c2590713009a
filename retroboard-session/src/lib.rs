//! Participant sessions for retroboard.
//!
//! A session is one participant's long-lived duplex channel with the
//! system. It subscribes to the room's fan-out channel, sends the stored
//! board as an initial snapshot, and then runs two concurrent halves:
//!
//! - the **read half** consumes boards from the participant, validates
//!   them, publishes them to the room and enqueues them for persistence;
//! - the **write half** forwards every fan-out message back to the
//!   participant and keeps the connection alive with pings.
//!
//! Failure of either half deterministically tears down the other and the
//! transport; one participant's failure never affects their peers.

mod conn;
mod error;
mod session;

pub use conn::{mock, BoardReader, BoardWriter, ReadEvent};
pub use error::{SessionError, SessionResult};
pub use session::{Session, SessionTimings};
