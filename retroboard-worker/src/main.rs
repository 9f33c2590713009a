//! The `worker` binary: drains the persistence queue and commits every
//! update through the optimistic-lock merge loop.
//!
//! Each envelope carries the originating session's trace context in its
//! header bag, so the persistence span lands on that request's trace even
//! though this process never saw the request.

use anyhow::Result;
use clap::Parser;
use retroboard_broker::{Broker, Envelope, RedisPubSub};
use retroboard_store::{RedisKv, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Bound on a single commit, CAS retries included.
const STORE_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(name = "retroboard-worker")]
#[command(about = "Retroboard merge worker")]
struct Config {
    /// Redis URL backing the durable store
    #[arg(long, env = "DATA_STORE_URL", default_value = "redis://127.0.0.1:6379")]
    data_store_url: String,

    /// Redis URL backing the persistence queue
    #[arg(long, env = "QUEUE_URL", default_value = "redis://127.0.0.1:6379")]
    queue_url: String,

    /// Channel the persistence queue publishes on
    #[arg(long, env = "QUEUE_KEY", default_value = "persist")]
    queue_key: String,

    /// OTLP collector endpoint; spans stay local when unset
    #[arg(long, env = "OTEL_AGENT_URL")]
    otel_agent_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    let _telemetry = retroboard_telemetry::init("worker", config.otel_agent_url.as_deref())?;

    let store = Arc::new(StateStore::new(connect_kv(&config.data_store_url).await?));
    let broker = Broker::new(connect_bus(&config.queue_url).await?);

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
            token.cancel();
        });
    }

    let mut updates = broker.subscribe(token.clone(), &config.queue_key).await?;
    info!(queue_key = %config.queue_key, "worker draining persistence queue");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            message = updates.recv() => {
                let Some(envelope) = message else { break };
                tokio::spawn(persist(Arc::clone(&store), envelope));
            }
        }
    }

    Ok(())
}

/// Commits one update, joined to the originating request's trace.
async fn persist(store: Arc<StateStore<RedisKv>>, envelope: Envelope) {
    let span = info_span!("persist update", room_id = %envelope.state.room_id);
    span.set_parent(envelope.extract_trace());

    async move {
        match tokio::time::timeout(STORE_TIMEOUT, store.commit(&envelope.state)).await {
            Ok(Ok(_)) => debug!("update persisted"),
            Ok(Err(err)) => warn!(%err, "dropping update"),
            Err(_) => warn!("dropping update after {}s", STORE_TIMEOUT.as_secs()),
        }
    }
    .instrument(span)
    .await
}

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
