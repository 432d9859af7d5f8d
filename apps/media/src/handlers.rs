use axum::{
    extract::{FromRequest, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::MediaError;
use crate::jobs::{JobStatus, MediaJob};
use crate::ops::{self, Family};
use crate::state::AppState;
use crate::storage::StoredFile;
use crate::worker::{spawn_job, JobSpec};

const FILE_FIELD: &str = "file";

/// `Json` whose rejections render as `MediaError` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(MediaError))]
pub struct MediaJson<T>(pub T);

fn parse_family(raw: &str) -> Result<Family, MediaError> {
    raw.parse::<Family>().map_err(MediaError::NotFound)
}

fn submitted(job: &MediaJob) -> Json<Value> {
    Json(json!({ "job_id": job.job_id, "status": job.status }))
}

/// POST /api/:family/upload
/// Multipart; the bytes come from the `file` field.
pub async fn upload(
    State(state): State<AppState>,
    Path(family): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<StoredFile>, MediaError> {
    let family = parse_family(&family)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MediaError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| MediaError::BadRequest(e.body_text()))?;
        if data.is_empty() {
            return Err(MediaError::BadRequest("Uploaded file is empty".to_string()));
        }

        let stored = state.storage.save_upload(family, &filename, data).await?;
        info!(%family, file_id = %stored.file_id, size = stored.size, "upload stored");
        return Ok(Json(stored));
    }

    Err(MediaError::BadRequest(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub operation: String,
    #[serde(default)]
    pub parameters: Value,
}

/// POST /api/:family/process/:file_id
/// Registers the job and returns at once; poll `job/:job_id` for the outcome.
pub async fn process(
    State(state): State<AppState>,
    Path((family, file_id)): Path<(String, Uuid)>,
    MediaJson(req): MediaJson<ProcessRequest>,
) -> Result<Json<Value>, MediaError> {
    let family = parse_family(&family)?;
    ops::validate_operation(family, &req.operation, true)
        .map_err(|e| MediaError::BadRequest(e.to_string()))?;

    let source = state
        .storage
        .find_upload(family, file_id)
        .await?
        .ok_or_else(|| MediaError::NotFound(format!("File {file_id} not found")))?;

    let job = state.jobs.create(
        family,
        &req.operation,
        json!({ "file_id": file_id, "parameters": req.parameters }),
    );
    info!(job_id = %job.job_id, %family, operation = %req.operation, "media job submitted");

    spawn_job(
        state.storage.clone(),
        state.jobs.clone(),
        JobSpec {
            job_id: job.job_id,
            family,
            operation: req.operation,
            parameters: req.parameters,
            source: Some(source),
        },
    );
    Ok(submitted(&job))
}

/// POST /api/audio/synthesize
/// Source-less audio jobs (`speech`, `music`).
pub async fn synthesize(
    State(state): State<AppState>,
    Path(family): Path<String>,
    MediaJson(req): MediaJson<ProcessRequest>,
) -> Result<Json<Value>, MediaError> {
    if parse_family(&family)? != Family::Audio {
        return Err(MediaError::NotFound(format!(
            "Synthesis is not available for {family}"
        )));
    }
    submit_without_source(&state, Family::Audio, req)
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    #[serde(default = "default_text_operation")]
    pub operation: String,
    #[serde(default)]
    pub parameters: Value,
}

fn default_text_operation() -> String {
    "statistics".to_string()
}

/// POST /api/text/analyze
/// Text passed inline instead of uploaded.
pub async fn analyze_text(
    State(state): State<AppState>,
    Path(family): Path<String>,
    MediaJson(req): MediaJson<AnalyzeTextRequest>,
) -> Result<Json<Value>, MediaError> {
    if parse_family(&family)? != Family::Text {
        return Err(MediaError::NotFound(format!(
            "Inline analysis is not available for {family}"
        )));
    }
    if req.text.trim().is_empty() {
        return Err(MediaError::BadRequest("text may not be blank".to_string()));
    }

    let mut parameters = match req.parameters {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    parameters.insert("text".to_string(), Value::String(req.text));

    submit_without_source(
        &state,
        Family::Text,
        ProcessRequest {
            operation: req.operation,
            parameters: Value::Object(parameters),
        },
    )
}

fn submit_without_source(
    state: &AppState,
    family: Family,
    req: ProcessRequest,
) -> Result<Json<Value>, MediaError> {
    ops::validate_operation(family, &req.operation, false)
        .map_err(|e| MediaError::BadRequest(e.to_string()))?;

    let job = state
        .jobs
        .create(family, &req.operation, json!({ "parameters": req.parameters }));
    info!(job_id = %job.job_id, %family, operation = %req.operation, "media job submitted");

    spawn_job(
        state.storage.clone(),
        state.jobs.clone(),
        JobSpec {
            job_id: job.job_id,
            family,
            operation: req.operation,
            parameters: req.parameters,
            source: None,
        },
    );
    Ok(submitted(&job))
}

fn find_job(state: &AppState, family: &str, job_id: Uuid) -> Result<MediaJob, MediaError> {
    let family = parse_family(family)?;
    state
        .jobs
        .get(job_id)
        .filter(|job| job.family == family)
        .ok_or_else(|| MediaError::NotFound(format!("Job {job_id} not found")))
}

/// GET /api/:family/job/:job_id
pub async fn job_status(
    State(state): State<AppState>,
    Path((family, job_id)): Path<(String, Uuid)>,
) -> Result<Json<MediaJob>, MediaError> {
    Ok(Json(find_job(&state, &family, job_id)?))
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// GET /api/:family/download/:job_id
pub async fn download(
    State(state): State<AppState>,
    Path((family, job_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, MediaError> {
    let job = find_job(&state, &family, job_id)?;
    if job.status != JobStatus::Completed {
        return Err(MediaError::BadRequest("Job not completed".to_string()));
    }
    let path = job
        .result_path
        .ok_or_else(|| MediaError::NotFound("Result file not found".to_string()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::NotFound("Result file not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let extension = path.rsplit('.').next().unwrap_or("bin");
    let disposition = format!("attachment; filename=\"{job_id}.{extension}\"");
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&path).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
