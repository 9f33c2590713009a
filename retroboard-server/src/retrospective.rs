//! WebSocket entry point and the socket-to-session transport adapter.

use crate::middleware::AuthenticatedRoom;
use crate::AppState;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use retroboard_broker::PubSub;
use retroboard_data::State as Board;
use retroboard_session::{BoardReader, BoardWriter, ReadEvent, SessionError, SessionResult};
use retroboard_store::Kv;
use std::sync::Arc;
use tracing::debug;

/// `GET /api/<v>/retrospectives/{room_id}` — upgrade and hand the socket to
/// a session. The room id comes from the auth middleware, which has already
/// matched it against the token's claim.
pub async fn retrospective<P: PubSub, K: Kv>(
    State(state): State<AppState<P, K>>,
    Extension(AuthenticatedRoom(room_id)): Extension<AuthenticatedRoom>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        debug!(%room_id, "participant connected");

        let (sink, stream) = socket.split();
        let token = state.shutdown.child_token();

        Arc::clone(&state.session)
            .run(WsReader { stream }, WsWriter { sink }, room_id, token)
            .await;
    })
}

struct WsReader {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl BoardReader for WsReader {
    async fn next(&mut self) -> SessionResult<ReadEvent> {
        loop {
            let message = match self.stream.next().await {
                None => return Ok(ReadEvent::Closed),
                Some(Err(err)) => return Err(SessionError::Transport(err.to_string())),
                Some(Ok(message)) => message,
            };

            match message {
                Message::Text(text) => {
                    let board: Board = serde_json::from_str(text.as_str())
                        .map_err(|err| SessionError::Decode(err.to_string()))?;
                    return Ok(ReadEvent::Board(board));
                }
                Message::Pong(_) => return Ok(ReadEvent::Pong),
                Message::Close(_) => return Ok(ReadEvent::Closed),
                // Pings are answered by the transport; binary frames are not
                // part of the protocol.
                Message::Ping(_) | Message::Binary(_) => continue,
            }
        }
    }
}

struct WsWriter {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl BoardWriter for WsWriter {
    async fn write_board(&mut self, state: &Board) -> SessionResult<()> {
        let text =
            serde_json::to_string(state).map_err(|err| SessionError::Decode(err.to_string()))?;

        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))
    }

    async fn write_ping(&mut self) -> SessionResult<()> {
        self.sink
            .send(Message::Ping(Vec::new().into()))
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}
