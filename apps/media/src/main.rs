mod config;
mod errors;
mod handlers;
mod jobs;
mod ops;
mod routes;
mod state;
mod storage;
mod worker;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::jobs::JobStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting media service v{}", env!("CARGO_PKG_VERSION"));

    let storage = Storage::new(&config.storage_dir);
    storage
        .ensure_layout()
        .await
        .with_context(|| format!("Failed to prepare {}", config.storage_dir.display()))?;
    info!(
        "Media storage at {} (max upload {} bytes)",
        config.storage_dir.display(),
        config.max_upload_bytes
    );

    let state = AppState {
        config: config.clone(),
        storage,
        jobs: JobStore::new(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
