//! The `api` binary: registration over HTTP, retrospectives over WebSocket.

use anyhow::{Context, Result};
use clap::Parser;
use retroboard_auth::{PasswordManager, TokenManager};
use retroboard_broker::{Broker, QueueProducer, RedisPubSub};
use retroboard_server::config::Config;
use retroboard_server::{build_router, AppState};
use retroboard_session::{Session, SessionTimings};
use retroboard_store::{RedisKv, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_BACKOFF: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    let _telemetry = retroboard_telemetry::init("api", config.otel_agent_url.as_deref())?;

    let store = Arc::new(StateStore::new(connect_kv(&config.data_store_url).await?));
    let broker = Arc::new(Broker::new(connect_bus(&config.broker_url).await?));
    let queue = Arc::new(QueueProducer::new(
        Broker::new(connect_bus(&config.queue_url).await?),
        config.queue_key.clone(),
    ));

    let shutdown = CancellationToken::new();
    let session = Arc::new(Session::new(
        Arc::clone(&broker),
        Arc::clone(&queue),
        Arc::clone(&store),
        SessionTimings::default(),
    ));

    let state = AppState {
        store,
        broker,
        queue,
        tokens: Arc::new(TokenManager::new(config.secret.as_bytes())),
        passwords: PasswordManager::new(),
        session,
        shutdown: shutdown.clone(),
    };

    let app = build_router(&config.version, state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("could not bind port {}", config.port))?;

    info!(port = config.port, version = %config.version, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// Waits for the store backend to answer pings, as deploys bring Redis and
/// the api up together.
async fn connect_kv(url: &str) -> Result<RedisKv> {
    let deadline = tokio::time::Instant::now() + CONNECT_TIMEOUT;

    loop {
        match RedisKv::connect(url).await {
            Ok(kv) if kv.ping().await.is_ok() => return Ok(kv),
            Ok(_) => debug!(%url, "store not answering pings yet"),
            Err(err) => debug!(%url, %err, "store not reachable yet"),
        }

        if tokio::time::Instant::now() + CONNECT_BACKOFF > deadline {
            anyhow::bail!("timeout connecting to redis at {url}");
        }

        tokio::time::sleep(CONNECT_BACKOFF).await;
    }
}

async fn connect_bus(url: &str) -> Result<RedisPubSub> {
    let deadline = tokio::time::Instant::now() + CONNECT_TIMEOUT;

    loop {
        match RedisPubSub::connect(url).await {
            Ok(bus) if bus.ping().await.is_ok() => return Ok(bus),
            Ok(_) => debug!(%url, "bus not answering pings yet"),
            Err(err) => debug!(%url, %err, "bus not reachable yet"),
        }

        if tokio::time::Instant::now() + CONNECT_BACKOFF > deadline {
            anyhow::bail!("timeout connecting to redis at {url}");
        }

        tokio::time::sleep(CONNECT_BACKOFF).await;
    }
}
