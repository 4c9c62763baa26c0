//! inference-relay binary.
//!
//! Reads its configuration from the environment and serves the relay until
//! the process is stopped.

use inference_relay::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting inference relay...");

    let server_config = ServerConfig::from_env()?;
    let relay_config = RelayConfig::from_env()?;
    tracing::info!("Relay configuration: {:?}", relay_config);

    // Missing upstream settings are reported per request, not at startup.
    if let Err(e) = relay_config.upstream_target() {
        tracing::warn!("{}; POST requests will fail with 500", e);
    }

    let upstream = HttpUpstream::new()?;
    let handler = RelayHandler::new(relay_config, Arc::new(upstream));

    RelayServer::new(server_config, handler).run().await
}
