//! One participant's session: subscribe, snapshot, then two halves.
//!
//! The read half and write half are independent tasks sharing no mutable
//! state. Each owns a cancellation token it cancels on exit and selects on
//! the other's, so either side's death tears the whole session down; a
//! background waiter cancels the session scope once both are gone. The
//! write half owns the transport's outbound sink and closes it on the way
//! out.

use crate::conn::{BoardReader, BoardWriter, ReadEvent};
use retroboard_broker::{Broker, Envelope, PubSub, QueueProducer};
use retroboard_data::validate;
use retroboard_store::{Kv, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, timeout, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Heartbeat and deadline configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    /// How long to wait for a pong before the read half gives up.
    pub pong_wait: Duration,
    /// How often the write half pings. Must be under `pong_wait`.
    pub ping_period: Duration,
    /// Deadline for any single write to the participant.
    pub write_wait: Duration,
}

impl SessionTimings {
    /// Derives the ping period as 9/10 of the pong wait.
    pub fn with_pong_wait(pong_wait: Duration, write_wait: Duration) -> Self {
        Self {
            pong_wait,
            ping_period: pong_wait.mul_f64(0.9),
            write_wait,
        }
    }
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self::with_pong_wait(Duration::from_secs(60), Duration::from_secs(10))
    }
}

/// Shared collaborators every session of a process hangs off.
pub struct Session<P, K> {
    broker: Arc<Broker<P>>,
    queue: Arc<QueueProducer>,
    store: Arc<StateStore<K>>,
    timings: SessionTimings,
}

impl<P: PubSub, K: Kv> Session<P, K> {
    pub fn new(
        broker: Arc<Broker<P>>,
        queue: Arc<QueueProducer>,
        store: Arc<StateStore<K>>,
        timings: SessionTimings,
    ) -> Self {
        Self {
            broker,
            queue,
            store,
            timings,
        }
    }

    /// Runs a session for one participant bound to `room_id`.
    ///
    /// Startup order matters: the room subscription is established first so
    /// nothing published after this point is missed, then the stored board
    /// (when there is one) goes out as the initial snapshot, and only then
    /// do the halves start.
    pub async fn run<R, W>(
        self: Arc<Self>,
        reader: R,
        mut writer: W,
        room_id: String,
        token: CancellationToken,
    ) where
        R: BoardReader,
        W: BoardWriter,
    {
        let session_token = token.child_token();
        let read_done = CancellationToken::new();
        let write_done = CancellationToken::new();

        {
            let session_token = session_token.clone();
            let read_done = read_done.clone();
            let write_done = write_done.clone();
            let room_id = room_id.clone();

            tokio::spawn(async move {
                write_done.cancelled().await;
                read_done.cancelled().await;
                session_token.cancel();
                debug!(%room_id, "session ended");
            });
        }

        let subscription = match self
            .broker
            .subscribe(session_token.clone(), &room_id)
            .await
        {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(%room_id, %err, "could not subscribe to room");
                read_done.cancel();
                write_done.cancel();
                writer.close().await;
                return;
            }
        };

        match self.store.state(&room_id).await {
            Ok(Some(state)) => {
                if let Err(err) = writer.write_board(&state).await {
                    warn!(%room_id, %err, "could not send initial snapshot");
                    read_done.cancel();
                    write_done.cancel();
                    writer.close().await;
                    return;
                }
            }
            Ok(None) => debug!(%room_id, "room has no stored board yet"),
            Err(err) => {
                warn!(%room_id, %err, "could not read initial snapshot");
                read_done.cancel();
                write_done.cancel();
                writer.close().await;
                return;
            }
        }

        tokio::spawn(Arc::clone(&self).read_loop(
            reader,
            room_id.clone(),
            session_token.clone(),
            read_done.clone(),
            write_done.clone(),
        ));

        tokio::spawn(self.clone().write_loop(
            writer,
            subscription,
            room_id,
            session_token,
            read_done,
            write_done,
        ));
    }

    /// Participant → system. Exits on deadline expiry, transport failure,
    /// validation failure, or the peer half's death.
    async fn read_loop<R: BoardReader>(
        self: Arc<Self>,
        mut reader: R,
        room_id: String,
        session_token: CancellationToken,
        read_done: CancellationToken,
        write_done: CancellationToken,
    ) {
        let _done = read_done.drop_guard();
        let mut deadline = Instant::now() + self.timings.pong_wait;

        debug!(%room_id, "read loop started");

        loop {
            tokio::select! {
                _ = write_done.cancelled() => return,
                _ = session_token.cancelled() => return,
                read = timeout_at(deadline, reader.next()) => {
                    let event = match read {
                        Err(_) => {
                            debug!(%room_id, "read deadline expired without a pong");
                            return;
                        }
                        Ok(Err(err)) => {
                            debug!(%room_id, %err, "could not read state");
                            return;
                        }
                        Ok(Ok(event)) => event,
                    };

                    match event {
                        ReadEvent::Pong => {
                            deadline = Instant::now() + self.timings.pong_wait;
                        }
                        ReadEvent::Closed => return,
                        ReadEvent::Board(mut state) => {
                            if let Err(err) = validate(&mut state) {
                                warn!(%room_id, %err, "rejecting invalid board");
                                return;
                            }

                            if state.room_id != room_id {
                                warn!(%room_id, got = %state.room_id, "read state contains the wrong room id");
                                return;
                            }

                            let envelope = Envelope::with_current_trace(state);

                            if let Err(err) = self.broker.publish(&room_id, &envelope).await {
                                warn!(%room_id, %err, "could not publish update");
                                return;
                            }

                            if let Err(err) = self.queue.enqueue(envelope) {
                                warn!(%room_id, %err, "could not enqueue update");
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    /// System → participant. Exits on write failure, a closed subscription,
    /// or the peer half's death. Closes the transport on the way out.
    async fn write_loop<W: BoardWriter>(
        self: Arc<Self>,
        mut writer: W,
        mut subscription: tokio::sync::mpsc::Receiver<Envelope>,
        room_id: String,
        session_token: CancellationToken,
        read_done: CancellationToken,
        write_done: CancellationToken,
    ) {
        let _done = write_done.drop_guard();
        let mut ticker = interval_at(
            Instant::now() + self.timings.ping_period,
            self.timings.ping_period,
        );

        debug!(%room_id, "write loop started");

        loop {
            tokio::select! {
                _ = read_done.cancelled() => break,
                _ = session_token.cancelled() => break,
                message = subscription.recv() => {
                    let Some(envelope) = message else {
                        debug!(%room_id, "broadcast closed");
                        break;
                    };

                    match timeout(self.timings.write_wait, writer.write_board(&envelope.state)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            debug!(%room_id, %err, "could not write state");
                            break;
                        }
                        Err(_) => {
                            debug!(%room_id, "write deadline expired");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    match timeout(self.timings.write_wait, writer.write_ping()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            debug!(%room_id, %err, "could not write ping");
                            break;
                        }
                        Err(_) => {
                            debug!(%room_id, "ping deadline expired");
                            break;
                        }
                    }
                }
            }
        }

        writer.close().await;
    }
}
