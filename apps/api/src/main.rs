mod ai;
mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod llm_client;
mod models;
mod resumes;
mod routes;
mod sections;
mod state;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::cache::{MemorySuggestionCache, RedisSuggestionCache, SuggestionCache};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

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

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    // Runs pending migrations before serving.
    let db = create_pool(&config.database_url).await?;

    let suggestion_cache: Arc<dyn SuggestionCache> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Skill suggestions cached in Redis");
            Arc::new(RedisSuggestionCache::new(client))
        }
        None => {
            warn!("REDIS_URL not set; skill suggestions cached in process memory");
            Arc::new(MemorySuggestionCache::default())
        }
    };

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.anthropic_api_key.clone(),
        config.deepseek_api_key.clone(),
    )?;
    for (provider, key) in [
        ("OpenAI", &config.openai_api_key),
        ("Anthropic", &config.anthropic_api_key),
        ("DeepSeek", &config.deepseek_api_key),
    ] {
        if key.is_none() {
            warn!("{provider} API key not set; its tasks will use fallbacks");
        }
    }

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        suggestion_cache,
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
