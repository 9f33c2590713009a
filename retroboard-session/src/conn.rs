//! Transport abstraction for a participant's duplex channel.
//!
//! The session never touches a socket directly: the read half consumes a
//! [`BoardReader`], the write half drives a [`BoardWriter`]. The server
//! crate adapts a WebSocket onto the pair; [`mock`] adapts channels for
//! tests.

use crate::error::SessionResult;
use async_trait::async_trait;
use retroboard_data::State;

/// One inbound event from the participant.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadEvent {
    /// A full board snapshot.
    Board(State),
    /// A heartbeat reply; resets the read deadline.
    Pong,
    /// The participant went away.
    Closed,
}

/// Inbound half of the transport.
#[async_trait]
pub trait BoardReader: Send + 'static {
    /// Waits for the next event from the participant.
    async fn next(&mut self) -> SessionResult<ReadEvent>;
}

/// Outbound half of the transport.
#[async_trait]
pub trait BoardWriter: Send + 'static {
    /// Sends a board snapshot to the participant.
    async fn write_board(&mut self, state: &State) -> SessionResult<()>;

    /// Sends a heartbeat ping.
    async fn write_ping(&mut self) -> SessionResult<()>;

    /// Closes the transport. Idempotent.
    async fn close(&mut self);
}

/// Channel-backed transport double for session tests.
pub mod mock {
    use super::*;
    use crate::error::SessionError;
    use tokio::sync::{mpsc, watch};

    /// What the session wrote to the participant.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Written {
        Board(State),
        Ping,
    }

    /// Builds a connected reader/writer pair plus the remote end a test
    /// drives.
    pub fn pair() -> (MockReader, MockWriter, MockRemote) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);

        (
            MockReader { rx: inbound_rx },
            MockWriter {
                tx: outbound_tx,
                closed: closed_tx,
            },
            MockRemote {
                tx: Some(inbound_tx),
                written: outbound_rx,
                closed: closed_rx,
            },
        )
    }

    pub struct MockReader {
        rx: mpsc::UnboundedReceiver<ReadEvent>,
    }

    #[async_trait]
    impl BoardReader for MockReader {
        async fn next(&mut self) -> SessionResult<ReadEvent> {
            Ok(self.rx.recv().await.unwrap_or(ReadEvent::Closed))
        }
    }

    pub struct MockWriter {
        tx: mpsc::UnboundedSender<Written>,
        closed: watch::Sender<bool>,
    }

    #[async_trait]
    impl BoardWriter for MockWriter {
        async fn write_board(&mut self, state: &State) -> SessionResult<()> {
            self.tx
                .send(Written::Board(state.clone()))
                .map_err(|_| SessionError::TransportClosed)
        }

        async fn write_ping(&mut self) -> SessionResult<()> {
            self.tx
                .send(Written::Ping)
                .map_err(|_| SessionError::TransportClosed)
        }

        async fn close(&mut self) {
            let _ = self.closed.send(true);
        }
    }

    /// The participant's side of the mock transport.
    pub struct MockRemote {
        tx: Option<mpsc::UnboundedSender<ReadEvent>>,
        written: mpsc::UnboundedReceiver<Written>,
        closed: watch::Receiver<bool>,
    }

    impl MockRemote {
        /// Sends a board to the session, as a participant would.
        pub fn send_board(&self, state: State) {
            if let Some(tx) = &self.tx {
                let _ = tx.send(ReadEvent::Board(state));
            }
        }

        /// Replies to a heartbeat.
        pub fn send_pong(&self) {
            if let Some(tx) = &self.tx {
                let _ = tx.send(ReadEvent::Pong);
            }
        }

        /// Hangs up the inbound direction.
        pub fn disconnect(&mut self) {
            self.tx = None;
        }

        /// Next frame the session wrote, or `None` once the writer is gone.
        pub async fn next_written(&mut self) -> Option<Written> {
            self.written.recv().await
        }

        /// Resolves once the session closed the transport.
        pub async fn wait_closed(&mut self) {
            while !*self.closed.borrow() {
                if self.closed.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}
