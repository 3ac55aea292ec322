//! projgrant REST API Server
//!
//! Run with: cargo run --features server --bin projgrant-server
//!
//! Environment:
//!   PROJGRANT_DB               - LMDB directory (default ./data/projgrant.mdb)
//!   PORT                       - Listen port (default 3000)
//!   HIT_AUTH_URL               - Identity service base URL (fallback HIT_AUTH_PUBLIC_URL)
//!   HIT_SERVICE_TOKEN          - Sent as X-Service-Token on group lookups
//!   HIT_AUTH_TIMEOUT_MS        - Group lookup timeout (default 3000)
//!   HIT_PROJECTS_READ_POLICY   - all_authenticated | groups_only, read per request
//!   RUST_LOG                   - Log filter (default info)

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use projgrant::{init, server, Authorizer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    tracing::info!(db = %config.db_path, "initializing grant store");
    init(&config.db_path)?;

    if config.auth_url.is_none() {
        tracing::warn!("no identity service configured; principals without group claims get no groups");
    }
    let auth = Arc::new(Authorizer::from_config(&config)?);
    let app = server::router(auth);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "projgrant server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
