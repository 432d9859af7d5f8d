pub mod export;
pub mod handlers;
pub mod store;
pub mod templates;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/templates", get(templates::list_templates))
        .route(
            "/api/v1/resumes",
            get(handlers::list_resumes).post(handlers::create_resume),
        )
        .route(
            "/api/v1/resumes/:resume_id",
            get(handlers::get_resume)
                .put(handlers::update_resume)
                .patch(handlers::patch_resume)
                .delete(handlers::delete_resume),
        )
        .route(
            "/api/v1/resumes/:resume_id/duplicate",
            post(handlers::duplicate_resume),
        )
        .route(
            "/api/v1/resumes/:resume_id/export",
            post(handlers::export_resume),
        )
        .route(
            "/api/v1/resumes/:resume_id/download/:format",
            get(handlers::download_resume),
        )
        .route(
            "/api/v1/resumes/:resume_id/analytics",
            get(handlers::get_analytics),
        )
        .route(
            "/api/v1/resumes/:resume_id/analytics/track-view",
            post(handlers::track_view),
        )
}
