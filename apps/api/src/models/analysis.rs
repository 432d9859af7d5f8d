use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One job-match analysis. Rows are appended, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobOptimizationRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub extracted_keywords: Vec<String>,
    pub missing_skills: Vec<String>,
    pub optimization_suggestions: Vec<String>,
    pub match_score: f64,
    pub created_at: DateTime<Utc>,
}

/// One ATS scan. Rows are appended, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AtsAnalysisRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub overall_score: f64,
    pub keyword_score: f64,
    pub format_score: f64,
    pub readability_score: f64,
    pub section_analysis: Value,
    pub recommendations: Vec<String>,
    pub scanned_text: String,
    pub created_at: DateTime<Utc>,
}
