use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::{self, ApiJson};
use crate::models::sections::PersonalInfo;
use crate::resumes::store::{ensure_owned, get_personal_info, upsert_personal_info};
use crate::state::AppState;

fn not_found(resume_id: Uuid) -> AppError {
    AppError::NotFound(format!("Personal info for resume {resume_id} not found"))
}

/// GET /api/v1/resumes/:resume_id/personal-info
pub async fn get_info(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<PersonalInfo>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    get_personal_info(&state.db, resume_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(resume_id))
}

/// PUT /api/v1/resumes/:resume_id/personal-info
/// Creates the record on first write.
pub async fn put_info(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(info): ApiJson<PersonalInfo>,
) -> Result<Json<PersonalInfo>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    info.validate()?;
    Ok(Json(upsert_personal_info(&state.db, resume_id, &info).await?))
}

/// PATCH /api/v1/resumes/:resume_id/personal-info
pub async fn patch_info(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(patch): ApiJson<Value>,
) -> Result<Json<PersonalInfo>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;

    let existing = get_personal_info(&state.db, resume_id)
        .await?
        .ok_or_else(|| not_found(resume_id))?;

    let Value::Object(patch) = patch else {
        return Err(AppError::Validation(
            "PATCH body must be a JSON object".to_string(),
        ));
    };
    let mut merged = serde_json::to_value(&existing).map_err(anyhow::Error::from)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(patch);
    }

    let info: PersonalInfo =
        extract::from_value(merged)?;
    info.validate()?;
    Ok(Json(upsert_personal_info(&state.db, resume_id, &info).await?))
}
