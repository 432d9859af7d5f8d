pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/:family/upload", post(handlers::upload))
        .route("/api/:family/process/:file_id", post(handlers::process))
        .route("/api/:family/synthesize", post(handlers::synthesize))
        .route("/api/:family/analyze", post(handlers::analyze_text))
        .route("/api/:family/job/:job_id", get(handlers::job_status))
        .route("/api/:family/download/:job_id", get(handlers::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::jobs::JobStore;
    use crate::ops::Family;
    use crate::storage::Storage;

    const BOUNDARY: &str = "media-test-boundary";

    fn test_state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            config: Config {
                port: 0,
                storage_dir: dir.path().to_path_buf(),
                max_upload_bytes: 1024 * 1024,
                rust_log: "info".into(),
            },
            storage: Storage::new(dir.path()),
            jobs: JobStore::new(),
        };
        (state, dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn upload_request(family: &str, filename: &str, content: &str) -> Request<Body> {
        upload_bytes_request(family, filename, content.as_bytes())
    }

    fn upload_bytes_request(family: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::post(format!("/api/{family}/upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn wait_until_done(app: &Router, family: &str, job_id: &str) -> Value {
        for _ in 0..200 {
            let (_, job) = send_json(
                app,
                Request::get(format!("/api/{family}/job/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            if job["status"] != "processing" {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} never finished");
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _dir) = test_state();
        let app = build_router(state);
        let (status, body) =
            send_json(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "media-service");
    }

    #[tokio::test]
    async fn test_upload_process_poll_download() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, stored) =
            send_json(&app, upload_request("text", "note.txt", "What a great, wonderful team")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["filename"], "note.txt");
        let file_id = stored["file_id"].as_str().unwrap().to_string();

        let (status, submitted) = send_json(
            &app,
            json_post(
                &format!("/api/text/process/{file_id}"),
                json!({ "operation": "sentiment" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submitted["status"], "processing");
        let job_id = submitted["job_id"].as_str().unwrap().to_string();

        let job = wait_until_done(&app, "text", &job_id).await;
        assert_eq!(job["status"], "completed");
        assert!(job["completed_at"].is_string());
        assert_eq!(job["metadata"]["file_id"], file_id.as_str());

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/text/download/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report["label"], "positive");
    }

    #[tokio::test]
    async fn test_synthesized_speech_downloads_as_wav() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, submitted) = send_json(
            &app,
            json_post(
                "/api/audio/synthesize",
                json!({ "operation": "speech", "parameters": { "text": "hi" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let job_id = submitted["job_id"].as_str().unwrap().to_string();

        let job = wait_until_done(&app, "audio", &job_id).await;
        assert_eq!(job["status"], "completed");

        let (status, bytes) = send(
            &app,
            Request::get(format!("/api/audio/download/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_inline_text_analysis() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (status, submitted) = send_json(
            &app,
            json_post("/api/text/analyze", json!({ "text": "One. Two. Three." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let job = wait_until_done(&app, "text", submitted["job_id"].as_str().unwrap()).await;
        assert_eq!(job["operation"], "statistics");
        assert_eq!(job["status"], "completed");
    }

    #[tokio::test]
    async fn test_download_of_unfinished_job_is_rejected() {
        let (state, _dir) = test_state();
        let job = state.jobs.create(Family::Audio, "music", json!({}));
        let app = build_router(state);

        let (status, body) = send_json(
            &app,
            Request::get(format!("/api/audio/download/{}", job.job_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Job not completed");
    }

    #[tokio::test]
    async fn test_unknown_job_and_family_are_not_found() {
        let (state, _dir) = test_state();
        let job = state.jobs.create(Family::Audio, "music", json!({}));
        let app = build_router(state);

        let unknown = Request::get(format!("/api/audio/job/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, unknown).await.0, StatusCode::NOT_FOUND);

        // Jobs are only visible under their own family.
        let wrong_family = Request::get(format!("/api/text/job/{}", job.job_id))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, wrong_family).await.0, StatusCode::NOT_FOUND);

        let bad_family = Request::get(format!("/api/video/job/{}", job.job_id))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, bad_family).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_operation_is_rejected_before_job_creation() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let (_, stored) = send_json(&app, upload_request("image", "x.png", "not really png")).await;
        let file_id = stored["file_id"].as_str().unwrap();

        let (status, _) = send_json(
            &app,
            json_post(
                &format!("/api/image/process/{file_id}"),
                json!({ "operation": "posterize" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_processing_missing_upload_is_not_found() {
        let (state, _dir) = test_state();
        let app = build_router(state);
        let (status, _) = send_json(
            &app,
            json_post(
                &format!("/api/audio/process/{}", Uuid::new_v4()),
                json!({ "operation": "echo" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_without_file_field_is_rejected() {
        let (state, _dir) = test_state();
        let app = build_router(state);
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::post("/api/audio/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        assert_eq!(send(&app, request).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_blur_downloads_as_png() {
        let (state, _dir) = test_state();
        let app = build_router(state);

        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(6, 4, image::Rgb([30, 60, 90])))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let (status, stored) =
            send_json(&app, upload_bytes_request("image", "photo.png", png.get_ref())).await;
        assert_eq!(status, StatusCode::OK);
        let file_id = stored["file_id"].as_str().unwrap().to_string();

        let (status, submitted) = send_json(
            &app,
            json_post(
                &format!("/api/image/process/{file_id}"),
                json!({ "operation": "blur", "parameters": { "kernel_size": 3 } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let job_id = submitted["job_id"].as_str().unwrap().to_string();

        let job = wait_until_done(&app, "image", &job_id).await;
        assert_eq!(job["status"], "completed");
        assert_eq!(job["metadata"]["width"], 6);

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/image/download/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_malformed_json_body_uses_error_envelope() {
        let (state, _dir) = test_state();
        let app = build_router(state);
        let request = Request::post("/api/text/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "#))
            .unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_wrongly_typed_field_is_bad_request() {
        let (state, _dir) = test_state();
        let app = build_router(state);
        let (status, body) = send_json(
            &app,
            json_post("/api/audio/synthesize", json!({ "operation": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].is_string());
    }
}
