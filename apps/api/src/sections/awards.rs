//! Award-only actions layered on top of the generic section routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::sections::{Award, AwardStatistics, SectionRow};
use crate::resumes::store::ensure_owned;
use crate::sections::store;
use crate::state::AppState;

/// GET /api/v1/resumes/:resume_id/awards/statistics
pub async fn statistics(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<AwardStatistics>, AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    let awards = store::list::<Award>(&state.db, resume_id).await?;
    Ok(Json(AwardStatistics::from_awards(
        awards.iter().map(|row| &row.data),
    )))
}

/// POST /api/v1/resumes/:resume_id/awards/:item_id/duplicate
/// The copy is appended at the end of the list.
pub async fn duplicate(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((resume_id, item_id)): Path<(Uuid, i64)>,
) -> Result<(StatusCode, Json<SectionRow<Award>>), AppError> {
    ensure_owned(&state.db, resume_id, user_id).await?;
    let source = store::get::<Award>(&state.db, resume_id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("awards entry {item_id} not found")))?;

    let copy = store::create(&state.db, resume_id, None, &source.data.duplicated()).await?;
    info!(%resume_id, source = item_id, copy = copy.id, "award duplicated");
    Ok((StatusCode::CREATED, Json(copy)))
}
