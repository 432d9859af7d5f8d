use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::sections::{
    Award, Certification, Education, Experience, Language, PersonalInfo, Project, Publication,
    Reference, SectionRow, Skill, Volunteer,
};
use crate::validation::{check_choice, check_max_len, check_score, require_text, FieldErrors};

pub const TEMPLATE_CHOICES: &[&str] = &[
    "modern",
    "classic",
    "creative",
    "minimal",
    "professional",
    "tech",
    "executive",
    "academic",
];

pub const EXPERIENCE_LEVELS: &[&str] = &["entry", "mid", "senior", "executive"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub template_id: String,
    pub ai_score: f64,
    pub ats_score: f64,
    pub readability_score: f64,
    pub is_public: bool,
    pub target_industry: String,
    pub target_role: String,
    pub experience_level: String,
    pub color_scheme: Value,
    pub font_settings: Value,
    pub layout_settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable resume metadata. Used for create, full update and (after merging
/// onto the stored row) partial update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeInput {
    pub title: String,
    pub template_id: String,
    pub is_public: bool,
    pub target_industry: String,
    pub target_role: String,
    pub experience_level: String,
    pub color_scheme: Value,
    pub font_settings: Value,
    pub layout_settings: Value,
    pub ai_score: Option<f64>,
    pub ats_score: Option<f64>,
    pub readability_score: Option<f64>,
}

impl Default for ResumeInput {
    fn default() -> Self {
        Self {
            title: "Untitled Resume".to_string(),
            template_id: "modern".to_string(),
            is_public: false,
            target_industry: String::new(),
            target_role: String::new(),
            experience_level: "mid".to_string(),
            color_scheme: Value::Object(Default::default()),
            font_settings: Value::Object(Default::default()),
            layout_settings: Value::Object(Default::default()),
            ai_score: None,
            ats_score: None,
            readability_score: None,
        }
    }
}

impl ResumeInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "title", &self.title, 200);
        check_choice(&mut errors, "template_id", &self.template_id, TEMPLATE_CHOICES);
        check_choice(
            &mut errors,
            "experience_level",
            &self.experience_level,
            EXPERIENCE_LEVELS,
        );
        check_max_len(&mut errors, "target_industry", &self.target_industry, 100);
        check_max_len(&mut errors, "target_role", &self.target_role, 100);
        check_score(&mut errors, "ai_score", self.ai_score);
        check_score(&mut errors, "ats_score", self.ats_score);
        check_score(&mut errors, "readability_score", self.readability_score);
        for (field, value) in [
            ("color_scheme", &self.color_scheme),
            ("font_settings", &self.font_settings),
            ("layout_settings", &self.layout_settings),
        ] {
            if !value.is_object() {
                errors.add(field, "Expected a JSON object");
            }
        }
        errors.into_result()
    }
}

impl From<&ResumeRow> for ResumeInput {
    fn from(row: &ResumeRow) -> Self {
        Self {
            title: row.title.clone(),
            template_id: row.template_id.clone(),
            is_public: row.is_public,
            target_industry: row.target_industry.clone(),
            target_role: row.target_role.clone(),
            experience_level: row.experience_level.clone(),
            color_scheme: row.color_scheme.clone(),
            font_settings: row.font_settings.clone(),
            layout_settings: row.layout_settings.clone(),
            ai_score: Some(row.ai_score),
            ats_score: Some(row.ats_score),
            readability_score: Some(row.readability_score),
        }
    }
}

/// A resume with every section loaded, as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeDetail {
    #[serde(flatten)]
    pub resume: ResumeRow,
    pub personal_info: Option<PersonalInfo>,
    pub experiences: Vec<SectionRow<Experience>>,
    pub education: Vec<SectionRow<Education>>,
    pub skills: Vec<SectionRow<Skill>>,
    pub projects: Vec<SectionRow<Project>>,
    pub certifications: Vec<SectionRow<Certification>>,
    pub languages: Vec<SectionRow<Language>>,
    pub awards: Vec<SectionRow<Award>>,
    pub publications: Vec<SectionRow<Publication>>,
    pub volunteer_experiences: Vec<SectionRow<Volunteer>>,
    pub references: Vec<SectionRow<Reference>>,
}

/// Usage counters kept one row per resume.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeAnalytics {
    pub views: i32,
    pub downloads: i32,
    pub ai_optimizations: i32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsCounter {
    View,
    Download,
    AiOptimization,
}

impl AnalyticsCounter {
    pub fn column(self) -> &'static str {
        match self {
            AnalyticsCounter::View => "views",
            AnalyticsCounter::Download => "downloads",
            AnalyticsCounter::AiOptimization => "ai_optimizations",
        }
    }
}

impl ResumeDetail {
    /// Flattens the resume into the plain-text form fed to the AI prompts.
    pub fn to_plain_text(&self) -> String {
        let mut parts = Vec::new();

        if let Some(info) = &self.personal_info {
            parts.push(format!("Name: {}", info.full_name));
            if !info.professional_summary.trim().is_empty() {
                parts.push(format!("Summary: {}", info.professional_summary));
            }
        }

        for exp in &self.experiences {
            parts.push(format!(
                "Experience: {} at {}",
                exp.data.position, exp.data.company
            ));
            if !exp.data.description.trim().is_empty() {
                parts.push(exp.data.description.clone());
            }
        }

        let skills: Vec<&str> = self.skills.iter().map(|s| s.data.name.as_str()).collect();
        if !skills.is_empty() {
            parts.push(format!("Skills: {}", skills.join(", ")));
        }

        for edu in &self.education {
            parts.push(format!(
                "Education: {} in {} from {}",
                edu.data.degree, edu.data.field_of_study, edu.data.institution
            ));
        }

        for project in &self.projects {
            parts.push(format!("Project: {}", project.data.title));
        }

        for cert in &self.certifications {
            parts.push(format!(
                "Certification: {} ({})",
                cert.data.name, cert.data.issuing_organization
            ));
        }

        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let input: ResumeInput = serde_json::from_value(json!({})).unwrap();
        assert_eq!(input.title, "Untitled Resume");
        assert_eq!(input.template_id, "modern");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_unknown_template_and_bad_score_rejected() {
        let input: ResumeInput = serde_json::from_value(json!({
            "template_id": "neon",
            "ats_score": 140.0,
            "font_settings": "serif",
        }))
        .unwrap();
        let errors = input.validate().unwrap_err();
        assert!(errors.contains("template_id"));
        assert!(errors.contains("ats_score"));
        assert!(errors.contains("font_settings"));
    }

    #[test]
    fn test_plain_text_lists_sections() {
        let detail = ResumeDetail {
            resume: ResumeRow {
                id: uuid::Uuid::nil(),
                user_id: uuid::Uuid::nil(),
                title: "CV".into(),
                template_id: "modern".into(),
                ai_score: 0.0,
                ats_score: 0.0,
                readability_score: 0.0,
                is_public: false,
                target_industry: String::new(),
                target_role: String::new(),
                experience_level: "mid".into(),
                color_scheme: json!({}),
                font_settings: json!({}),
                layout_settings: json!({}),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            personal_info: Some(
                serde_json::from_value(json!({
                    "full_name": "Ada Lovelace",
                    "email": "ada@example.com",
                    "professional_summary": "Analyst.",
                }))
                .unwrap(),
            ),
            experiences: vec![SectionRow {
                id: 1,
                resume_id: uuid::Uuid::nil(),
                order: 0,
                data: serde_json::from_value(json!({
                    "company": "Analytical Engines",
                    "position": "Programmer",
                    "start_date": "1842-01-01",
                    "description": "Wrote the first algorithm.",
                }))
                .unwrap(),
            }],
            education: vec![],
            skills: vec![],
            projects: vec![],
            certifications: vec![],
            languages: vec![],
            awards: vec![],
            publications: vec![],
            volunteer_experiences: vec![],
            references: vec![],
        };

        let text = detail.to_plain_text();
        assert_eq!(
            text,
            "Name: Ada Lovelace\nSummary: Analyst.\nExperience: Programmer at Analytical Engines\nWrote the first algorithm."
        );
    }

    #[test]
    fn test_counter_columns_are_distinct() {
        let columns = [
            AnalyticsCounter::View,
            AnalyticsCounter::Download,
            AnalyticsCounter::AiOptimization,
        ]
        .map(AnalyticsCounter::column);
        assert_eq!(columns, ["views", "downloads", "ai_optimizations"]);
    }
}
