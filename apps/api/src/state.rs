use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::cache::SuggestionCache;
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    /// Skill-suggestion memo. Redis in production, in-memory in tests.
    pub suggestion_cache: Arc<dyn SuggestionCache>,
}
