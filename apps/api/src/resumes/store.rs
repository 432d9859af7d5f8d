use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{
    AnalyticsCounter, ResumeAnalytics, ResumeDetail, ResumeInput, ResumeRow,
};
use crate::models::sections::{
    Award, Certification, Education, Experience, Language, PersonalInfo, Project, Publication,
    Reference, Skill, Volunteer,
};
use crate::sections::store as sections;

/// Loads a resume only if it belongs to `user_id`. Anything else is a 404,
/// so other users' ids are indistinguishable from missing ones.
pub async fn find_owned(
    db: &PgPool,
    resume_id: Uuid,
    user_id: Uuid,
) -> Result<ResumeRow, AppError> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(resume_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))
}

pub async fn ensure_owned(db: &PgPool, resume_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let owned: Option<bool> =
        sqlx::query_scalar("SELECT TRUE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(resume_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    owned
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))
}

pub async fn touch_resume(conn: &mut PgConnection, resume_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resumes SET updated_at = NOW() WHERE id = $1")
        .bind(resume_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> Result<Vec<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    input: &ResumeInput,
) -> Result<ResumeRow, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, user_id, title, template_id, is_public, target_industry, target_role,
             experience_level, color_scheme, font_settings, layout_settings,
             ai_score, ats_score, readability_score)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.template_id)
    .bind(input.is_public)
    .bind(&input.target_industry)
    .bind(&input.target_role)
    .bind(&input.experience_level)
    .bind(&input.color_scheme)
    .bind(&input.font_settings)
    .bind(&input.layout_settings)
    .bind(input.ai_score.unwrap_or(0.0))
    .bind(input.ats_score.unwrap_or(0.0))
    .bind(input.readability_score.unwrap_or(0.0))
    .fetch_one(db)
    .await
}

/// Scores left as `None` keep their stored value.
pub async fn update(
    db: &PgPool,
    resume_id: Uuid,
    input: &ResumeInput,
) -> Result<ResumeRow, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes SET
            title = $2,
            template_id = $3,
            is_public = $4,
            target_industry = $5,
            target_role = $6,
            experience_level = $7,
            color_scheme = $8,
            font_settings = $9,
            layout_settings = $10,
            ai_score = COALESCE($11, ai_score),
            ats_score = COALESCE($12, ats_score),
            readability_score = COALESCE($13, readability_score),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(&input.title)
    .bind(&input.template_id)
    .bind(input.is_public)
    .bind(&input.target_industry)
    .bind(&input.target_role)
    .bind(&input.experience_level)
    .bind(&input.color_scheme)
    .bind(&input.font_settings)
    .bind(&input.layout_settings)
    .bind(input.ai_score)
    .bind(input.ats_score)
    .bind(input.readability_score)
    .fetch_one(db)
    .await
}

pub async fn update_scores<'c>(
    db: impl PgExecutor<'c>,
    resume_id: Uuid,
    ai_score: Option<f64>,
    ats_score: Option<f64>,
    readability_score: Option<f64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE resumes SET
            ai_score = COALESCE($2, ai_score),
            ats_score = COALESCE($3, ats_score),
            readability_score = COALESCE($4, readability_score),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(resume_id)
    .bind(ai_score)
    .bind(ats_score)
    .bind(readability_score)
    .execute(db)
    .await?;
    Ok(())
}

/// Child rows go with it (`ON DELETE CASCADE`).
pub async fn delete(db: &PgPool, resume_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(resume_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn get_personal_info(
    db: &PgPool,
    resume_id: Uuid,
) -> Result<Option<PersonalInfo>, sqlx::Error> {
    sqlx::query_as::<_, PersonalInfo>("SELECT * FROM personal_info WHERE resume_id = $1")
        .bind(resume_id)
        .fetch_optional(db)
        .await
}

pub async fn upsert_personal_info(
    db: &PgPool,
    resume_id: Uuid,
    info: &PersonalInfo,
) -> Result<PersonalInfo, sqlx::Error> {
    let mut tx = db.begin().await?;
    let saved = sqlx::query_as::<_, PersonalInfo>(
        r#"
        INSERT INTO personal_info
            (resume_id, full_name, email, phone, location, website, linkedin, github,
             portfolio, professional_summary, nationality, date_of_birth)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (resume_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            location = EXCLUDED.location,
            website = EXCLUDED.website,
            linkedin = EXCLUDED.linkedin,
            github = EXCLUDED.github,
            portfolio = EXCLUDED.portfolio,
            professional_summary = EXCLUDED.professional_summary,
            nationality = EXCLUDED.nationality,
            date_of_birth = EXCLUDED.date_of_birth
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(&info.full_name)
    .bind(&info.email)
    .bind(&info.phone)
    .bind(&info.location)
    .bind(&info.website)
    .bind(&info.linkedin)
    .bind(&info.github)
    .bind(&info.portfolio)
    .bind(&info.professional_summary)
    .bind(&info.nationality)
    .bind(info.date_of_birth)
    .fetch_one(&mut *tx)
    .await?;
    touch_resume(&mut tx, resume_id).await?;
    tx.commit().await?;
    Ok(saved)
}

pub async fn load_detail(db: &PgPool, resume: ResumeRow) -> Result<ResumeDetail, sqlx::Error> {
    let id = resume.id;
    Ok(ResumeDetail {
        personal_info: get_personal_info(db, id).await?,
        experiences: sections::list::<Experience>(db, id).await?,
        education: sections::list::<Education>(db, id).await?,
        skills: sections::list::<Skill>(db, id).await?,
        projects: sections::list::<Project>(db, id).await?,
        certifications: sections::list::<Certification>(db, id).await?,
        languages: sections::list::<Language>(db, id).await?,
        awards: sections::list::<Award>(db, id).await?,
        publications: sections::list::<Publication>(db, id).await?,
        volunteer_experiences: sections::list::<Volunteer>(db, id).await?,
        references: sections::list::<Reference>(db, id).await?,
        resume,
    })
}

/// Copies metadata, personal info and every section into a new resume owned
/// by the same user. Scores start from zero on the copy.
pub async fn duplicate(db: &PgPool, source: &ResumeRow) -> Result<ResumeRow, sqlx::Error> {
    let mut tx = db.begin().await?;
    let new_id = Uuid::new_v4();

    let copy = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, user_id, title, template_id, is_public, target_industry, target_role,
             experience_level, color_scheme, font_settings, layout_settings)
        SELECT $1, user_id, title || ' (Copy)', template_id, FALSE, target_industry,
               target_role, experience_level, color_scheme, font_settings, layout_settings
        FROM resumes WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(new_id)
    .bind(source.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO personal_info
            (resume_id, full_name, email, phone, location, website, linkedin, github,
             portfolio, professional_summary, nationality, date_of_birth)
        SELECT $1, full_name, email, phone, location, website, linkedin, github,
               portfolio, professional_summary, nationality, date_of_birth
        FROM personal_info WHERE resume_id = $2
        "#,
    )
    .bind(new_id)
    .bind(source.id)
    .execute(&mut *tx)
    .await?;

    sections::copy_all::<Experience>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Education>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Skill>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Project>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Certification>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Language>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Award>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Publication>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Volunteer>(&mut tx, source.id, new_id).await?;
    sections::copy_all::<Reference>(&mut tx, source.id, new_id).await?;

    tx.commit().await?;
    Ok(copy)
}

/// Counters for a resume, creating the zeroed row on first read.
pub async fn get_or_create_analytics(
    db: &PgPool,
    resume_id: Uuid,
) -> Result<ResumeAnalytics, sqlx::Error> {
    sqlx::query_as::<_, ResumeAnalytics>(
        r#"
        INSERT INTO resume_analytics (resume_id) VALUES ($1)
        ON CONFLICT (resume_id) DO UPDATE SET resume_id = EXCLUDED.resume_id
        RETURNING views, downloads, ai_optimizations, last_updated
        "#,
    )
    .bind(resume_id)
    .fetch_one(db)
    .await
}

pub async fn bump_analytics<'c>(
    db: impl PgExecutor<'c>,
    resume_id: Uuid,
    counter: AnalyticsCounter,
) -> Result<ResumeAnalytics, sqlx::Error> {
    let column = counter.column();
    let sql = format!(
        "INSERT INTO resume_analytics (resume_id, {column}) VALUES ($1, 1) \
         ON CONFLICT (resume_id) DO UPDATE \
         SET {column} = resume_analytics.{column} + 1, last_updated = NOW() \
         RETURNING views, downloads, ai_optimizations, last_updated"
    );
    sqlx::query_as::<_, ResumeAnalytics>(&sql)
        .bind(resume_id)
        .fetch_one(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sections::Skill;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_duplicate_copies_sections(db: PgPool) {
        let user = Uuid::new_v4();
        let input = ResumeInput {
            title: "Backend".into(),
            ..Default::default()
        };
        let original = insert(&db, user, &input).await.unwrap();
        let skill = Skill {
            name: "Rust".into(),
            category: "technical".into(),
            proficiency: "expert".into(),
            years_experience: Some(5),
            is_featured: true,
        };
        sections::create(&db, original.id, None, &skill).await.unwrap();

        let copy = duplicate(&db, &original).await.unwrap();
        assert_eq!(copy.title, "Backend (Copy)");
        assert_eq!(copy.user_id, user);

        let skills = sections::list::<Skill>(&db, copy.id).await.unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].data.name, "Rust");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_foreign_resume_is_not_found(db: PgPool) {
        let owner = Uuid::new_v4();
        let resume = insert(&db, owner, &ResumeInput::default()).await.unwrap();

        assert!(find_owned(&db, resume.id, owner).await.is_ok());
        let err = find_owned(&db, resume.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_analytics_counters_accumulate(db: PgPool) {
        let resume = insert(&db, Uuid::new_v4(), &ResumeInput::default()).await.unwrap();

        let fresh = get_or_create_analytics(&db, resume.id).await.unwrap();
        assert_eq!((fresh.views, fresh.downloads, fresh.ai_optimizations), (0, 0, 0));

        bump_analytics(&db, resume.id, AnalyticsCounter::View).await.unwrap();
        bump_analytics(&db, resume.id, AnalyticsCounter::View).await.unwrap();
        let after = bump_analytics(&db, resume.id, AnalyticsCounter::Download)
            .await
            .unwrap();
        assert_eq!((after.views, after.downloads, after.ai_optimizations), (2, 1, 0));
    }
}
