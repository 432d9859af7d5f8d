pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .merge(crate::resumes::routes())
        .merge(crate::sections::routes())
        .merge(crate::ai::routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::ai::cache::{suggestion_cache_key, MemorySuggestionCache, SuggestionCache, SUGGESTION_TTL};
    use crate::auth::USER_ID_HEADER;
    use crate::config::Config;
    use crate::llm_client::testing::offline_client;

    const USER: &str = "7d1c8a5e-3f2b-4c6d-9e8f-0a1b2c3d4e5f";

    // The pool never connects: these routes reject or answer before any query.
    fn state_with(cache: Arc<dyn SuggestionCache>) -> AppState {
        let config = Config {
            database_url: "postgres://localhost/unused".into(),
            redis_url: None,
            openai_api_key: None,
            anthropic_api_key: None,
            deepseek_api_key: None,
            public_base_url: "http://localhost:8080".into(),
            port: 8080,
            rust_log: "info".into(),
        };
        AppState {
            db: PgPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap(),
            llm: offline_client(),
            config,
            suggestion_cache: cache,
        }
    }

    fn app() -> Router {
        build_router(state_with(Arc::new(MemorySuggestionCache::default())))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(
            app(),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "resume-api");
    }

    #[tokio::test]
    async fn test_missing_user_header_is_unauthorized() {
        let (status, body) = send(
            app(),
            Request::get("/api/v1/resumes").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_malformed_user_header_is_unauthorized() {
        let request = Request::get("/api/v1/resumes/00000000-0000-0000-0000-000000000000/skills")
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_templates_catalogue() {
        let (status, body) = send(
            app(),
            Request::get("/api/v1/templates").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(5));
        assert_eq!(body[0]["id"], "modern");
    }

    #[tokio::test]
    async fn test_trailing_slash_is_not_routed() {
        let request = Request::get("/api/v1/templates/")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_suggestions_require_industry_and_role() {
        let request = Request::get("/api/v1/skills/suggestions?industry=Fintech")
            .header(USER_ID_HEADER, USER)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["role"].is_array());
    }

    #[tokio::test]
    async fn test_suggestions_served_from_cache() {
        let cache = Arc::new(MemorySuggestionCache::default());
        cache
            .put(
                &suggestion_cache_key("Fintech", "Backend"),
                r#"{"technical_skills":[{"name":"Rust"}],"soft_skills":[],"tools_software":[]}"#
                    .to_string(),
                SUGGESTION_TTL,
            )
            .await;
        let app = build_router(state_with(cache));

        let request = Request::get("/api/v1/skills/suggestions?industry=Fintech&role=Backend")
            .header(USER_ID_HEADER, USER)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["technical_skills"][0]["name"], "Rust");
    }

    #[tokio::test]
    async fn test_offline_suggestions_return_empty_set() {
        let request = Request::get("/api/v1/skills/suggestions?industry=Retail&role=Buyer")
            .header(USER_ID_HEADER, USER)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["technical_skills"], serde_json::json!([]));
    }

    const RESUME: &str = "00000000-0000-0000-0000-0000000000aa";

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(USER_ID_HEADER, USER)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unparseable_date_is_a_field_error() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/experiences"),
            r#"{"company":"Initech","position":"Engineer","start_date":"not-a-date"}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["fields"]["start_date"].is_array());
    }

    #[tokio::test]
    async fn test_missing_required_field_is_a_field_error() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/experiences"),
            r#"{"company":"Initech","position":"Engineer"}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["start_date"].is_array());
    }

    #[tokio::test]
    async fn test_truncated_json_is_bad_request() {
        let request = post_json("/api/v1/resumes", r#"{"title": "#);
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::post("/api/v1/resumes")
            .header(USER_ID_HEADER, USER)
            .body(Body::from(r#"{"title":"CV"}"#))
            .unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_out_of_range_score_rejected_before_insert() {
        let request = post_json("/api/v1/resumes", r#"{"title":"CV","ai_score":150}"#);
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["ai_score"].is_array());
        assert!(body["error"]["fields"].get("title").is_none());
    }

    #[tokio::test]
    async fn test_bulk_body_errors_keyed_by_index() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/skills/bulk-update"),
            r#"{"items":[{"name":"Rust"},{"name":"Go","years_experience":"many"}]}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["items[1].years_experience"].is_array());
    }

    #[tokio::test]
    async fn test_end_before_start_is_rejected() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/experiences"),
            r#"{"company":"Initech","position":"Engineer","start_date":"2021-01-01","end_date":"2020-01-01"}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["fields"]["end_date"][0],
            "End date cannot be before start date"
        );
    }

    #[tokio::test]
    async fn test_current_position_with_end_date_is_rejected() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/experiences"),
            r#"{"company":"Initech","position":"Engineer","start_date":"2020-01-01","end_date":"2021-01-01","is_current":true}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["end_date"].is_array());
    }

    #[tokio::test]
    async fn test_bulk_validation_errors_keyed_by_index() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/volunteer-experiences/bulk-update"),
            r#"{"items":[
                {"organization":"Food Bank","role":"Driver","start_date":"2020-01-01"},
                {"organization":"Shelter","role":"Walker","start_date":"2020-01-01","hours_per_week":200}
            ]}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["fields"]["items[1].hours_per_week"][0],
            "Hours per week cannot exceed 168"
        );
        assert!(body["error"]["fields"].get("items[0].hours_per_week").is_none());
    }

    #[tokio::test]
    async fn test_recurring_award_without_frequency_is_rejected() {
        let request = post_json(
            &format!("/api/v1/resumes/{RESUME}/awards"),
            r#"{"title":"Dean's List","issuer":"MIT","date":"2020-06-01","is_recurring":true}"#,
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["recurrence_frequency"].is_array());
    }

    #[tokio::test]
    async fn test_unknown_download_format_is_rejected() {
        let request = Request::get(format!("/api/v1/resumes/{RESUME}/download/odt"))
            .header(USER_ID_HEADER, USER)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["format"].is_array());
    }
}
