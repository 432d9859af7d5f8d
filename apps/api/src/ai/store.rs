use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::ai::orchestrator::{AtsScan, JobMatchAnalysis};
use crate::models::analysis::{AtsAnalysisRow, JobOptimizationRow};

// Append-only: INSERT a new record per run, never UPDATE.

pub async fn insert_job_optimization<'c>(
    db: impl PgExecutor<'c>,
    resume_id: Uuid,
    job_title: &str,
    company: &str,
    job_description: &str,
    analysis: &JobMatchAnalysis,
) -> Result<JobOptimizationRow, sqlx::Error> {
    sqlx::query_as::<_, JobOptimizationRow>(
        r#"
        INSERT INTO job_optimizations
            (id, resume_id, job_title, company, job_description, extracted_keywords,
             missing_skills, optimization_suggestions, match_score)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(job_title)
    .bind(company)
    .bind(job_description)
    .bind(&analysis.extracted_keywords)
    .bind(&analysis.missing_skills)
    .bind(&analysis.optimization_suggestions)
    .bind(analysis.match_score)
    .fetch_one(db)
    .await
}

pub async fn list_job_optimizations(
    db: &PgPool,
    resume_id: Uuid,
) -> Result<Vec<JobOptimizationRow>, sqlx::Error> {
    sqlx::query_as::<_, JobOptimizationRow>(
        "SELECT * FROM job_optimizations WHERE resume_id = $1 ORDER BY created_at DESC",
    )
    .bind(resume_id)
    .fetch_all(db)
    .await
}

pub async fn insert_ats_analysis<'c>(
    db: impl PgExecutor<'c>,
    resume_id: Uuid,
    scanned_text: &str,
    scan: &AtsScan,
) -> Result<AtsAnalysisRow, sqlx::Error> {
    sqlx::query_as::<_, AtsAnalysisRow>(
        r#"
        INSERT INTO ats_analyses
            (id, resume_id, overall_score, keyword_score, format_score, readability_score,
             section_analysis, recommendations, scanned_text)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(scan.overall_score)
    .bind(scan.keyword_score)
    .bind(scan.format_score)
    .bind(scan.readability_score)
    .bind(&scan.section_analysis)
    .bind(&scan.recommendations)
    .bind(scanned_text)
    .fetch_one(db)
    .await
}

pub async fn list_ats_analyses(
    db: &PgPool,
    resume_id: Uuid,
) -> Result<Vec<AtsAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, AtsAnalysisRow>(
        "SELECT * FROM ats_analyses WHERE resume_id = $1 ORDER BY created_at DESC",
    )
    .bind(resume_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_job_optimizations_are_appended_newest_first(db: PgPool) {
        let resume_id = Uuid::new_v4();
        sqlx::query("INSERT INTO resumes (id, user_id) VALUES ($1, $2)")
            .bind(resume_id)
            .bind(Uuid::new_v4())
            .execute(&db)
            .await
            .unwrap();

        let first = JobMatchAnalysis {
            match_score: 40.0,
            ..Default::default()
        };
        let second = JobMatchAnalysis {
            match_score: 75.0,
            ..Default::default()
        };
        let jd = "Build and run payment services in Rust";
        insert_job_optimization(&db, resume_id, "SRE", "", jd, &first)
            .await
            .unwrap();
        insert_job_optimization(&db, resume_id, "SRE", "", jd, &second)
            .await
            .unwrap();

        let rows = list_job_optimizations(&db, resume_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].match_score, 75.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_uncommitted_scan_leaves_no_trace(db: PgPool) {
        let resume_id = Uuid::new_v4();
        sqlx::query("INSERT INTO resumes (id, user_id) VALUES ($1, $2)")
            .bind(resume_id)
            .bind(Uuid::new_v4())
            .execute(&db)
            .await
            .unwrap();

        let scan = AtsScan {
            overall_score: 80.0,
            keyword_score: 70.0,
            format_score: 90.0,
            readability_score: 65.0,
            section_analysis: serde_json::json!({}),
            ..Default::default()
        };
        {
            let mut tx = db.begin().await.unwrap();
            insert_ats_analysis(&mut *tx, resume_id, "Rust engineer", &scan)
                .await
                .unwrap();
            crate::resumes::store::update_scores(&mut *tx, resume_id, None, Some(80.0), Some(65.0))
                .await
                .unwrap();
        }

        assert!(list_ats_analyses(&db, resume_id).await.unwrap().is_empty());
        let ats: f64 = sqlx::query_scalar("SELECT ats_score FROM resumes WHERE id = $1")
            .bind(resume_id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(ats, 0.0);
    }
}
