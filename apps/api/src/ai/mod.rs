pub mod cache;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod scoring;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/resumes/:resume_id/ai/generate-content",
            post(handlers::generate_content),
        )
        .route(
            "/api/v1/resumes/:resume_id/ai/optimize-job",
            post(handlers::optimize_job),
        )
        .route(
            "/api/v1/resumes/:resume_id/ai/score",
            post(handlers::score_resume),
        )
        .route(
            "/api/v1/resumes/:resume_id/ai/ats-scan",
            post(handlers::ats_scan),
        )
        .route(
            "/api/v1/resumes/:resume_id/job-optimizations",
            get(handlers::list_job_optimizations),
        )
        .route(
            "/api/v1/resumes/:resume_id/ats-analyses",
            get(handlers::list_ats_analyses),
        )
        .route(
            "/api/v1/skills/suggestions",
            get(handlers::skill_suggestions),
        )
}
