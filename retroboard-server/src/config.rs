//! Environment-driven configuration for the api binary.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "retroboard-api")]
#[command(about = "Retroboard HTTP and WebSocket server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// API version segment used in routes
    #[arg(long, env = "VERSION", default_value = "v1")]
    pub version: String,

    /// Token signing secret
    #[arg(long, env = "SECRET")]
    pub secret: String,

    /// Redis URL backing the durable store
    #[arg(long, env = "DATA_STORE_URL", default_value = "redis://127.0.0.1:6379")]
    pub data_store_url: String,

    /// Redis URL backing the room fan-out bus
    #[arg(long, env = "BROKER_URL", default_value = "redis://127.0.0.1:6379")]
    pub broker_url: String,

    /// Redis URL backing the persistence queue
    #[arg(long, env = "QUEUE_URL", default_value = "redis://127.0.0.1:6379")]
    pub queue_url: String,

    /// Channel the persistence queue publishes on
    #[arg(long, env = "QUEUE_KEY", default_value = "persist")]
    pub queue_key: String,

    /// OTLP collector endpoint; spans stay local when unset
    #[arg(long, env = "OTEL_AGENT_URL")]
    pub otel_agent_url: Option<String>,
}
