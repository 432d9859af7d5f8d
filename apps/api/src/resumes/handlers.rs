use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::{self, ApiJson};
use crate::models::resume::{
    AnalyticsCounter, ResumeAnalytics, ResumeDetail, ResumeInput, ResumeRow,
};
use crate::resumes::export::{
    build_export_link, render_html, ExportLink, ExportRequest, EXPORT_FORMATS, RENDERED_FORMATS,
};
use crate::resumes::store;
use crate::state::AppState;
use crate::validation::{check_choice, FieldErrors};

/// GET /api/v1/resumes
pub async fn list_resumes(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    Ok(Json(store::list_for_user(&state.db, user_id).await?))
}

/// POST /api/v1/resumes
pub async fn create_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(input): ApiJson<ResumeInput>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    input.validate()?;
    let resume = store::insert(&state.db, user_id, &input).await?;
    info!(resume_id = %resume.id, %user_id, "resume created");
    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/v1/resumes/:resume_id
/// Returns the resume with every section loaded.
pub async fn get_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeDetail>, AppError> {
    let resume = store::find_owned(&state.db, resume_id, user_id).await?;
    Ok(Json(store::load_detail(&state.db, resume).await?))
}

/// PUT /api/v1/resumes/:resume_id
pub async fn update_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(input): ApiJson<ResumeInput>,
) -> Result<Json<ResumeRow>, AppError> {
    store::ensure_owned(&state.db, resume_id, user_id).await?;
    input.validate()?;
    Ok(Json(store::update(&state.db, resume_id, &input).await?))
}

/// PATCH /api/v1/resumes/:resume_id
pub async fn patch_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(patch): ApiJson<Value>,
) -> Result<Json<ResumeRow>, AppError> {
    let existing = store::find_owned(&state.db, resume_id, user_id).await?;

    let Value::Object(patch) = patch else {
        return Err(AppError::Validation(
            "PATCH body must be a JSON object".to_string(),
        ));
    };
    let mut merged =
        serde_json::to_value(ResumeInput::from(&existing)).map_err(anyhow::Error::from)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(patch);
    }

    let input: ResumeInput = extract::from_value(merged)?;
    input.validate()?;
    Ok(Json(store::update(&state.db, resume_id, &input).await?))
}

/// DELETE /api/v1/resumes/:resume_id
pub async fn delete_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store::ensure_owned(&state.db, resume_id, user_id).await?;
    store::delete(&state.db, resume_id).await?;
    info!(%resume_id, "resume deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:resume_id/duplicate
pub async fn duplicate_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let source = store::find_owned(&state.db, resume_id, user_id).await?;
    let copy = store::duplicate(&state.db, &source).await?;
    info!(source = %resume_id, copy = %copy.id, "resume duplicated");
    Ok((StatusCode::CREATED, Json(copy)))
}

/// POST /api/v1/resumes/:resume_id/export
pub async fn export_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(req): ApiJson<ExportRequest>,
) -> Result<Json<ExportLink>, AppError> {
    store::ensure_owned(&state.db, resume_id, user_id).await?;
    req.validate()?;
    store::bump_analytics(&state.db, resume_id, AnalyticsCounter::Download).await?;
    info!(%resume_id, format = %req.format, "export requested");
    Ok(Json(build_export_link(
        &state.config.public_base_url,
        resume_id,
        &req.format,
        Utc::now(),
    )))
}

/// GET /api/v1/resumes/:resume_id/download/:format
/// Serves the file an export link points at.
pub async fn download_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((resume_id, format)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::default();
    check_choice(&mut errors, "format", &format, EXPORT_FORMATS);
    errors.into_result()?;

    let resume = store::find_owned(&state.db, resume_id, user_id).await?;
    if !RENDERED_FORMATS.contains(&format.as_str()) {
        return Err(AppError::NotImplemented(format!(
            "{format} rendering is not available"
        )));
    }
    let detail = store::load_detail(&state.db, resume).await?;
    let disposition = format!("attachment; filename=\"resume-{resume_id}.html\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_html(&detail),
    )
        .into_response())
}

/// GET /api/v1/resumes/:resume_id/analytics
pub async fn get_analytics(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeAnalytics>, AppError> {
    store::ensure_owned(&state.db, resume_id, user_id).await?;
    Ok(Json(store::get_or_create_analytics(&state.db, resume_id).await?))
}

/// POST /api/v1/resumes/:resume_id/analytics/track-view
pub async fn track_view(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    store::ensure_owned(&state.db, resume_id, user_id).await?;
    store::bump_analytics(&state.db, resume_id, AnalyticsCounter::View).await?;
    Ok(Json(json!({ "message": "View tracked successfully" })))
}
