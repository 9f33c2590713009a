//! HTTP surface of retroboard: registration, auth middleware, and the
//! WebSocket upgrade that hands participants to the session layer.
//!
//! The router is generic over the bus and store backends so the handler
//! tests run against the in-memory doubles.

pub mod config;
pub mod middleware;
pub mod registration;
pub mod retrospective;

use axum::routing::{get, post};
use axum::Router;
use retroboard_auth::{PasswordManager, TokenManager};
use retroboard_broker::{Broker, PubSub, QueueProducer};
use retroboard_session::Session;
use retroboard_store::{Kv, StateStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared collaborators behind every handler.
pub struct AppState<P, K> {
    pub store: Arc<StateStore<K>>,
    pub broker: Arc<Broker<P>>,
    pub queue: Arc<QueueProducer>,
    pub tokens: Arc<TokenManager>,
    pub passwords: PasswordManager,
    pub session: Arc<Session<P, K>>,
    pub shutdown: CancellationToken,
}

impl<P, K> Clone for AppState<P, K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            broker: Arc::clone(&self.broker),
            queue: Arc::clone(&self.queue),
            tokens: Arc::clone(&self.tokens),
            passwords: self.passwords,
            session: Arc::clone(&self.session),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Builds the application router for the given API version.
pub fn build_router<P: PubSub, K: Kv>(version: &str, state: AppState<P, K>) -> Router {
    let registration = Router::new()
        .route("/create", post(registration::create::<P, K>))
        .route("/join", post(registration::join::<P, K>))
        .layer(axum::middleware::from_fn(middleware::json_content_type));

    let retrospectives = Router::new()
        .route("/{room_id}", get(retrospective::retrospective::<P, K>))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate::<P, K>,
        ));

    Router::new()
        .nest(&format!("/api/{version}/registration"), registration)
        .nest(&format!("/api/{version}/retrospectives"), retrospectives)
        .layer(axum::middleware::from_fn(middleware::correlate))
        .with_state(state)
}
