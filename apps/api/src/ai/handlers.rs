use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::ai::orchestrator::{
    self, clamp_score, GenerateContentRequest, JobMatchAnalysis, SkillSuggestions,
};
use crate::ai::prompts::WRITING_STYLES;
use crate::ai::scoring::{compute_resume_score, ScoreBreakdown, ScoreSnapshot};
use crate::ai::store;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::analysis::{AtsAnalysisRow, JobOptimizationRow};
use crate::models::resume::AnalyticsCounter;
use crate::resumes::store as resumes;
use crate::state::AppState;
use crate::validation::{check_choice, check_max_len, require_text, word_count, FieldErrors};

const MIN_JOB_DESCRIPTION_WORDS: usize = 20;

/// POST /api/v1/resumes/:resume_id/ai/generate-content
/// Never fails on provider errors; the section's fallback is returned instead.
pub async fn generate_content(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(req): ApiJson<GenerateContentRequest>,
) -> Result<Json<Value>, AppError> {
    let resume = resumes::find_owned(&state.db, resume_id, user_id).await?;

    let mut errors = FieldErrors::default();
    check_choice(&mut errors, "writing_style", &req.writing_style, WRITING_STYLES);
    errors.into_result()?;

    let detail = resumes::load_detail(&state.db, resume).await?;
    let content = orchestrator::generate_content(
        &state.llm,
        state.suggestion_cache.as_ref(),
        &detail,
        &req,
    )
    .await;

    Ok(Json(json!({
        "generated_content": content,
        "section": req.section,
    })))
}

#[derive(Debug, Deserialize)]
pub struct OptimizeJobRequest {
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    pub job_description: String,
}

impl OptimizeJobRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "job_title", &self.job_title, 200);
        check_max_len(&mut errors, "company_name", &self.company_name, 200);
        if word_count(&self.job_description) < MIN_JOB_DESCRIPTION_WORDS {
            errors.add(
                "job_description",
                format!("Job description must contain at least {MIN_JOB_DESCRIPTION_WORDS} words"),
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct OptimizeJobResponse {
    pub optimization_id: Uuid,
    #[serde(flatten)]
    pub analysis: JobMatchAnalysis,
}

/// POST /api/v1/resumes/:resume_id/ai/optimize-job
pub async fn optimize_job(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
    ApiJson(req): ApiJson<OptimizeJobRequest>,
) -> Result<Json<OptimizeJobResponse>, AppError> {
    let resume = resumes::find_owned(&state.db, resume_id, user_id).await?;
    req.validate()?;

    let detail = resumes::load_detail(&state.db, resume).await?;
    let analysis = orchestrator::analyze_job_match(
        &state.llm,
        &detail.to_plain_text(),
        &req.job_title,
        &req.job_description,
    )
    .await
    .map_err(|e| AppError::upstream("Failed to optimize resume", e))?;

    let mut tx = state.db.begin().await?;
    let row = store::insert_job_optimization(
        &mut *tx,
        resume_id,
        req.job_title.trim(),
        req.company_name.trim(),
        &req.job_description,
        &analysis,
    )
    .await?;
    resumes::bump_analytics(&mut *tx, resume_id, AnalyticsCounter::AiOptimization).await?;
    tx.commit().await?;
    info!(%resume_id, optimization_id = %row.id, match_score = row.match_score, "job match stored");

    Ok(Json(OptimizeJobResponse {
        optimization_id: row.id,
        analysis,
    }))
}

/// POST /api/v1/resumes/:resume_id/ai/score
/// Recomputes the heuristic score and persists overall and ATS components.
pub async fn score_resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    let resume = resumes::find_owned(&state.db, resume_id, user_id).await?;
    let detail = resumes::load_detail(&state.db, resume).await?;

    let score = compute_resume_score(&ScoreSnapshot::from(&detail));
    resumes::update_scores(
        &state.db,
        resume_id,
        Some(clamp_score(score.overall_score)),
        Some(clamp_score(score.ats_compatibility)),
        None,
    )
    .await?;

    Ok(Json(score.rounded()))
}

/// POST /api/v1/resumes/:resume_id/ai/ats-scan
pub async fn ats_scan(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<AtsAnalysisRow>, AppError> {
    let resume = resumes::find_owned(&state.db, resume_id, user_id).await?;
    let detail = resumes::load_detail(&state.db, resume).await?;

    let text = detail.to_plain_text();
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume has no content to scan".to_string(),
        ));
    }

    let scan = orchestrator::scan_ats(&state.llm, &text)
        .await
        .map_err(|e| AppError::upstream("Failed to analyze resume", e))?;

    // The analysis row and the scores it produced land together or not at all.
    let mut tx = state.db.begin().await?;
    let row = store::insert_ats_analysis(&mut *tx, resume_id, &text, &scan).await?;
    resumes::update_scores(
        &mut *tx,
        resume_id,
        None,
        Some(scan.overall_score),
        Some(scan.readability_score),
    )
    .await?;
    tx.commit().await?;
    info!(%resume_id, analysis_id = %row.id, overall = row.overall_score, "ATS scan stored");

    Ok(Json(row))
}

/// GET /api/v1/resumes/:resume_id/job-optimizations
pub async fn list_job_optimizations(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<JobOptimizationRow>>, AppError> {
    resumes::ensure_owned(&state.db, resume_id, user_id).await?;
    Ok(Json(store::list_job_optimizations(&state.db, resume_id).await?))
}

/// GET /api/v1/resumes/:resume_id/ats-analyses
pub async fn list_ats_analyses(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<AtsAnalysisRow>>, AppError> {
    resumes::ensure_owned(&state.db, resume_id, user_id).await?;
    Ok(Json(store::list_ats_analyses(&state.db, resume_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub role: String,
}

/// GET /api/v1/skills/suggestions?industry=&role=
pub async fn skill_suggestions(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<SkillSuggestions>, AppError> {
    let mut errors = FieldErrors::default();
    require_text(&mut errors, "industry", &query.industry, 100);
    require_text(&mut errors, "role", &query.role, 100);
    errors.into_result()?;

    let suggestions = orchestrator::suggest_skills(
        &state.llm,
        state.suggestion_cache.as_ref(),
        query.industry.trim(),
        query.role.trim(),
    )
    .await;
    Ok(Json(suggestions))
}
