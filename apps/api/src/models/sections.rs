//! Resume sections: one struct per child table plus the `Section` trait the
//! generic controller is written against.
//!
//! Each section struct carries only its own columns. The shared `id`,
//! `resume_id` and `order` live on `SectionRow<T>`, so a section type doubles
//! as the create/update payload and as the `data` part of a stored row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres, Row};
use uuid::Uuid;

use crate::validation::{
    check_choice, check_date_order, check_email, check_max_len, check_non_negative,
    check_open_ended, require_text, word_count, FieldErrors, CURRENT_WITH_END, END_BEFORE_START,
    EXPIRES_BEFORE_ISSUE, ONGOING_WITH_END,
};

pub const SKILL_CATEGORIES: &[&str] = &[
    "technical",
    "soft",
    "language",
    "tools",
    "frameworks",
    "industry",
];
pub const SKILL_PROFICIENCY: &[&str] = &["beginner", "intermediate", "advanced", "expert"];
pub const LANGUAGE_PROFICIENCY: &[&str] = &["basic", "conversational", "professional", "native"];

pub const SUMMARY_MAX_WORDS: usize = 300;

const SHORT: usize = 100;
const MEDIUM: usize = 200;
const URL: usize = 500;

/// A list section stored in its own child table.
///
/// `COLUMNS` lists the data columns in the order `push_binds` emits values;
/// the generic store builds every INSERT/UPDATE from it.
pub trait Section:
    Serialize
    + DeserializeOwned
    + Clone
    + Send
    + Sync
    + Unpin
    + 'static
    + for<'r> FromRow<'r, PgRow>
{
    const TABLE: &'static str;
    /// URL segment under `/api/v1/resumes/:resume_id/`.
    const PATH: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Tie-breaker after `sort_order`.
    const NATURAL_ORDER: &'static str;

    fn validate(&self) -> Result<(), FieldErrors>;

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>);
}

/// A stored section entry.
#[derive(Debug, Clone, Serialize)]
pub struct SectionRow<T> {
    pub id: i64,
    pub resume_id: Uuid,
    pub order: i32,
    #[serde(flatten)]
    pub data: T,
}

impl<'r, T> FromRow<'r, PgRow> for SectionRow<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            resume_id: row.try_get("resume_id")?,
            order: row.try_get("sort_order")?,
            data: T::from_row(row)?,
        })
    }
}

// ─── Personal info (one per resume, not a list section) ─────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub portfolio: String,
    #[serde(default)]
    pub professional_summary: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl PersonalInfo {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "full_name", &self.full_name, MEDIUM);
        check_email(&mut errors, "email", &self.email);
        check_max_len(&mut errors, "phone", &self.phone, 20);
        check_max_len(&mut errors, "location", &self.location, MEDIUM);
        for (field, value) in [
            ("website", &self.website),
            ("linkedin", &self.linkedin),
            ("github", &self.github),
            ("portfolio", &self.portfolio),
        ] {
            check_max_len(&mut errors, field, value, URL);
        }
        if word_count(&self.professional_summary) > SUMMARY_MAX_WORDS {
            errors.add(
                "professional_summary",
                format!("Professional summary should not exceed {SUMMARY_MAX_WORDS} words"),
            );
        }
        errors.into_result()
    }
}

// ─── Experience ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Experience {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl Section for Experience {
    const TABLE: &'static str = "experiences";
    const PATH: &'static str = "experiences";
    const COLUMNS: &'static [&'static str] = &[
        "company",
        "position",
        "location",
        "start_date",
        "end_date",
        "is_current",
        "description",
        "achievements",
        "technologies",
    ];
    const NATURAL_ORDER: &'static str = "start_date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "company", &self.company, MEDIUM);
        require_text(&mut errors, "position", &self.position, MEDIUM);
        check_max_len(&mut errors, "location", &self.location, MEDIUM);
        check_date_order(
            &mut errors,
            "end_date",
            Some(self.start_date),
            self.end_date,
            END_BEFORE_START,
        );
        check_open_ended(
            &mut errors,
            "end_date",
            self.is_current,
            self.end_date,
            CURRENT_WITH_END,
        );
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.company.clone())
            .push_bind(self.position.clone())
            .push_bind(self.location.clone())
            .push_bind(self.start_date)
            .push_bind(self.end_date)
            .push_bind(self.is_current)
            .push_bind(self.description.clone())
            .push_bind(self.achievements.clone())
            .push_bind(self.technologies.clone());
    }
}

// ─── Education ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub honors: String,
    #[serde(default)]
    pub relevant_coursework: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
}

impl Section for Education {
    const TABLE: &'static str = "education";
    const PATH: &'static str = "education";
    const COLUMNS: &'static [&'static str] = &[
        "institution",
        "degree",
        "field_of_study",
        "location",
        "start_date",
        "end_date",
        "gpa",
        "honors",
        "relevant_coursework",
        "activities",
    ];
    const NATURAL_ORDER: &'static str = "start_date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "institution", &self.institution, MEDIUM);
        require_text(&mut errors, "degree", &self.degree, MEDIUM);
        check_max_len(&mut errors, "field_of_study", &self.field_of_study, MEDIUM);
        check_max_len(&mut errors, "gpa", &self.gpa, 10);
        check_date_order(
            &mut errors,
            "end_date",
            Some(self.start_date),
            self.end_date,
            END_BEFORE_START,
        );
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.institution.clone())
            .push_bind(self.degree.clone())
            .push_bind(self.field_of_study.clone())
            .push_bind(self.location.clone())
            .push_bind(self.start_date)
            .push_bind(self.end_date)
            .push_bind(self.gpa.clone())
            .push_bind(self.honors.clone())
            .push_bind(self.relevant_coursework.clone())
            .push_bind(self.activities.clone());
    }
}

// ─── Skill ──────────────────────────────────────────────────────────────────

fn default_skill_category() -> String {
    "technical".to_string()
}

fn default_skill_proficiency() -> String {
    "intermediate".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub name: String,
    #[serde(default = "default_skill_category")]
    pub category: String,
    #[serde(default = "default_skill_proficiency")]
    pub proficiency: String,
    #[serde(default)]
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

impl Section for Skill {
    const TABLE: &'static str = "skills";
    const PATH: &'static str = "skills";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "category",
        "proficiency",
        "years_experience",
        "is_featured",
    ];
    const NATURAL_ORDER: &'static str = "category, name";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", &self.name, SHORT);
        check_choice(&mut errors, "category", &self.category, SKILL_CATEGORIES);
        check_choice(&mut errors, "proficiency", &self.proficiency, SKILL_PROFICIENCY);
        check_non_negative(&mut errors, "years_experience", self.years_experience);
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.name.clone())
            .push_bind(self.category.clone())
            .push_bind(self.proficiency.clone())
            .push_bind(self.years_experience)
            .push_bind(self.is_featured);
    }
}

// ─── Project ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_ongoing: bool,
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub live_url: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub role: String,
}

impl Section for Project {
    const TABLE: &'static str = "projects";
    const PATH: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "technologies",
        "start_date",
        "end_date",
        "is_ongoing",
        "github_url",
        "live_url",
        "achievements",
        "role",
    ];
    const NATURAL_ORDER: &'static str = "start_date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "title", &self.title, MEDIUM);
        check_max_len(&mut errors, "github_url", &self.github_url, URL);
        check_max_len(&mut errors, "live_url", &self.live_url, URL);
        check_max_len(&mut errors, "role", &self.role, SHORT);
        check_date_order(
            &mut errors,
            "end_date",
            Some(self.start_date),
            self.end_date,
            END_BEFORE_START,
        );
        check_open_ended(
            &mut errors,
            "end_date",
            self.is_ongoing,
            self.end_date,
            ONGOING_WITH_END,
        );
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.technologies.clone())
            .push_bind(self.start_date)
            .push_bind(self.end_date)
            .push_bind(self.is_ongoing)
            .push_bind(self.github_url.clone())
            .push_bind(self.live_url.clone())
            .push_bind(self.achievements.clone())
            .push_bind(self.role.clone());
    }
}

// ─── Certification ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certification {
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub credential_id: String,
    #[serde(default)]
    pub credential_url: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl Section for Certification {
    const TABLE: &'static str = "certifications";
    const PATH: &'static str = "certifications";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "issuing_organization",
        "issue_date",
        "expiration_date",
        "credential_id",
        "credential_url",
        "is_featured",
    ];
    const NATURAL_ORDER: &'static str = "issue_date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", &self.name, MEDIUM);
        require_text(
            &mut errors,
            "issuing_organization",
            &self.issuing_organization,
            MEDIUM,
        );
        check_max_len(&mut errors, "credential_url", &self.credential_url, URL);
        check_date_order(
            &mut errors,
            "expiration_date",
            Some(self.issue_date),
            self.expiration_date,
            EXPIRES_BEFORE_ISSUE,
        );
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.name.clone())
            .push_bind(self.issuing_organization.clone())
            .push_bind(self.issue_date)
            .push_bind(self.expiration_date)
            .push_bind(self.credential_id.clone())
            .push_bind(self.credential_url.clone())
            .push_bind(self.is_featured);
    }
}

// ─── Language ───────────────────────────────────────────────────────────────

fn default_language_proficiency() -> String {
    "conversational".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Language {
    pub name: String,
    #[serde(default = "default_language_proficiency")]
    pub proficiency: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl Section for Language {
    const TABLE: &'static str = "languages";
    const PATH: &'static str = "languages";
    const COLUMNS: &'static [&'static str] = &["name", "proficiency", "is_featured"];
    const NATURAL_ORDER: &'static str = "name";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", &self.name, SHORT);
        check_choice(
            &mut errors,
            "proficiency",
            &self.proficiency,
            LANGUAGE_PROFICIENCY,
        );
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.name.clone())
            .push_bind(self.proficiency.clone())
            .push_bind(self.is_featured);
    }
}

// ─── Award ──────────────────────────────────────────────────────────────────

pub const AWARD_CATEGORIES: &[&str] = &[
    "academic",
    "professional",
    "leadership",
    "innovation",
    "service",
    "athletic",
    "research",
    "technical",
    "sales",
    "other",
];
pub const PRESTIGE_LEVELS: &[&str] = &[
    "international",
    "national",
    "regional",
    "local",
    "organizational",
];

fn default_award_category() -> String {
    "professional".to_string()
}

fn default_prestige_level() -> String {
    "organizational".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Award {
    pub title: String,
    pub issuer: String,
    pub date: NaiveDate,
    #[serde(default = "default_award_category")]
    pub category: String,
    #[serde(default = "default_prestige_level")]
    pub prestige_level: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub monetary_value: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub competition_size: Option<i32>,
    #[serde(default)]
    pub selection_ratio: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_frequency: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl Section for Award {
    const TABLE: &'static str = "awards";
    const PATH: &'static str = "awards";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "issuer",
        "date",
        "category",
        "prestige_level",
        "description",
        "monetary_value",
        "currency",
        "competition_size",
        "selection_ratio",
        "is_recurring",
        "recurrence_frequency",
        "url",
        "is_featured",
    ];
    const NATURAL_ORDER: &'static str = "date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "title", &self.title, MEDIUM);
        require_text(&mut errors, "issuer", &self.issuer, MEDIUM);
        check_choice(&mut errors, "category", &self.category, AWARD_CATEGORIES);
        check_choice(
            &mut errors,
            "prestige_level",
            &self.prestige_level,
            PRESTIGE_LEVELS,
        );
        if self.monetary_value.is_some_and(|value| value < 0.0 || value.is_nan()) {
            errors.add("monetary_value", "Monetary value cannot be negative");
        }
        check_max_len(&mut errors, "currency", &self.currency, 3);
        if self.competition_size.is_some_and(|size| size < 1) {
            errors.add("competition_size", "Competition size must be at least 1");
        }
        check_max_len(&mut errors, "selection_ratio", &self.selection_ratio, 50);
        if self.is_recurring && self.recurrence_frequency.trim().is_empty() {
            errors.add(
                "recurrence_frequency",
                "Recurring awards must specify frequency",
            );
        }
        check_max_len(
            &mut errors,
            "recurrence_frequency",
            &self.recurrence_frequency,
            50,
        );
        check_max_len(&mut errors, "url", &self.url, URL);
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.title.clone())
            .push_bind(self.issuer.clone())
            .push_bind(self.date)
            .push_bind(self.category.clone())
            .push_bind(self.prestige_level.clone())
            .push_bind(self.description.clone())
            .push_bind(self.monetary_value)
            .push_bind(self.currency.clone())
            .push_bind(self.competition_size)
            .push_bind(self.selection_ratio.clone())
            .push_bind(self.is_recurring)
            .push_bind(self.recurrence_frequency.clone())
            .push_bind(self.url.clone())
            .push_bind(self.is_featured);
    }
}

/// Per-resume award roll-up. Every category and prestige level is present,
/// zero when unused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwardStatistics {
    pub total_awards: usize,
    pub featured_awards: usize,
    pub awards_with_monetary_value: usize,
    pub total_monetary_value: f64,
    pub recurring_awards: usize,
    pub by_category: BTreeMap<&'static str, usize>,
    pub by_prestige_level: BTreeMap<&'static str, usize>,
}

impl AwardStatistics {
    pub fn from_awards<'a>(awards: impl IntoIterator<Item = &'a Award>) -> Self {
        let mut stats = AwardStatistics {
            total_awards: 0,
            featured_awards: 0,
            awards_with_monetary_value: 0,
            total_monetary_value: 0.0,
            recurring_awards: 0,
            by_category: AWARD_CATEGORIES.iter().map(|c| (*c, 0)).collect(),
            by_prestige_level: PRESTIGE_LEVELS.iter().map(|l| (*l, 0)).collect(),
        };
        for award in awards {
            stats.total_awards += 1;
            stats.featured_awards += usize::from(award.is_featured);
            stats.recurring_awards += usize::from(award.is_recurring);
            if let Some(value) = award.monetary_value {
                stats.awards_with_monetary_value += 1;
                stats.total_monetary_value += value;
            }
            if let Some(count) = stats.by_category.get_mut(award.category.as_str()) {
                *count += 1;
            }
            if let Some(count) = stats.by_prestige_level.get_mut(award.prestige_level.as_str()) {
                *count += 1;
            }
        }
        stats
    }
}

impl Award {
    /// Copy placed next to the original: retitled and never featured.
    pub fn duplicated(&self) -> Self {
        Award {
            title: format!("{} (Copy)", self.title),
            is_featured: false,
            ..self.clone()
        }
    }
}

// ─── Publication ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Publication {
    pub title: String,
    pub authors: String,
    pub publication: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl Section for Publication {
    const TABLE: &'static str = "publications";
    const PATH: &'static str = "publications";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "authors",
        "publication",
        "date",
        "url",
        "description",
    ];
    const NATURAL_ORDER: &'static str = "date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "title", &self.title, 300);
        require_text(&mut errors, "authors", &self.authors, URL);
        require_text(&mut errors, "publication", &self.publication, MEDIUM);
        check_max_len(&mut errors, "url", &self.url, URL);
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.title.clone())
            .push_bind(self.authors.clone())
            .push_bind(self.publication.clone())
            .push_bind(self.date)
            .push_bind(self.url.clone())
            .push_bind(self.description.clone());
    }
}

// ─── Volunteer experience ───────────────────────────────────────────────────

pub const VOLUNTEER_CATEGORIES: &[&str] = &[
    "community",
    "education",
    "healthcare",
    "environment",
    "animals",
    "arts",
    "sports",
    "religious",
    "humanitarian",
    "other",
];

pub const MAX_HOURS_PER_WEEK: i32 = 168;

fn default_volunteer_category() -> String {
    "community".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Volunteer {
    pub organization: String,
    pub role: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_ongoing: bool,
    #[serde(default = "default_volunteer_category")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub skills_gained: Vec<String>,
    #[serde(default)]
    pub hours_per_week: Option<i32>,
    #[serde(default)]
    pub total_hours: Option<i32>,
    #[serde(default)]
    pub website: String,
}

impl Section for Volunteer {
    const TABLE: &'static str = "volunteer_experiences";
    const PATH: &'static str = "volunteer-experiences";
    const COLUMNS: &'static [&'static str] = &[
        "organization",
        "role",
        "location",
        "start_date",
        "end_date",
        "is_ongoing",
        "category",
        "description",
        "achievements",
        "skills_gained",
        "hours_per_week",
        "total_hours",
        "website",
    ];
    const NATURAL_ORDER: &'static str = "start_date DESC";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "organization", &self.organization, MEDIUM);
        require_text(&mut errors, "role", &self.role, MEDIUM);
        check_max_len(&mut errors, "location", &self.location, MEDIUM);
        check_choice(&mut errors, "category", &self.category, VOLUNTEER_CATEGORIES);
        check_date_order(
            &mut errors,
            "end_date",
            Some(self.start_date),
            self.end_date,
            END_BEFORE_START,
        );
        check_open_ended(
            &mut errors,
            "end_date",
            self.is_ongoing,
            self.end_date,
            ONGOING_WITH_END,
        );
        check_non_negative(&mut errors, "hours_per_week", self.hours_per_week);
        if self.hours_per_week.is_some_and(|hours| hours > MAX_HOURS_PER_WEEK) {
            errors.add("hours_per_week", "Hours per week cannot exceed 168");
        }
        check_non_negative(&mut errors, "total_hours", self.total_hours);
        check_max_len(&mut errors, "website", &self.website, URL);
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.organization.clone())
            .push_bind(self.role.clone())
            .push_bind(self.location.clone())
            .push_bind(self.start_date)
            .push_bind(self.end_date)
            .push_bind(self.is_ongoing)
            .push_bind(self.category.clone())
            .push_bind(self.description.clone())
            .push_bind(self.achievements.clone())
            .push_bind(self.skills_gained.clone())
            .push_bind(self.hours_per_week)
            .push_bind(self.total_hours)
            .push_bind(self.website.clone());
    }
}

// ─── Reference ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reference {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub years_known: Option<i32>,
}

impl Section for Reference {
    const TABLE: &'static str = "references_list";
    const PATH: &'static str = "references";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "position",
        "company",
        "email",
        "phone",
        "relationship",
        "years_known",
    ];
    const NATURAL_ORDER: &'static str = "name";

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", &self.name, SHORT);
        if !self.email.trim().is_empty() {
            check_email(&mut errors, "email", &self.email);
        }
        check_max_len(&mut errors, "phone", &self.phone, 20);
        check_non_negative(&mut errors, "years_known", self.years_known);
        errors.into_result()
    }

    fn push_binds<'qb, 'args: 'qb>(&self, sep: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        sep.push_bind(self.name.clone())
            .push_bind(self.position.clone())
            .push_bind(self.company.clone())
            .push_bind(self.email.clone())
            .push_bind(self.phone.clone())
            .push_bind(self.relationship.clone())
            .push_bind(self.years_known);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn experience(end: Option<&str>, current: bool) -> Experience {
        serde_json::from_value(json!({
            "company": "Initech",
            "position": "Engineer",
            "start_date": "2021-03-01",
            "end_date": end,
            "is_current": current,
        }))
        .unwrap()
    }

    #[test]
    fn test_experience_end_before_start_rejected() {
        let errors = experience(Some("2020-01-01"), false).validate().unwrap_err();
        assert_eq!(errors.messages("end_date"), [END_BEFORE_START]);
    }

    #[test]
    fn test_current_experience_with_end_rejected() {
        let errors = experience(Some("2022-01-01"), true).validate().unwrap_err();
        assert_eq!(errors.messages("end_date"), [CURRENT_WITH_END]);
    }

    #[test]
    fn test_open_current_experience_accepted() {
        assert!(experience(None, true).validate().is_ok());
    }

    #[test]
    fn test_ongoing_project_with_end_rejected() {
        let project: Project = serde_json::from_value(json!({
            "title": "Compiler",
            "start_date": "2023-01-01",
            "end_date": "2023-06-01",
            "is_ongoing": true,
        }))
        .unwrap();
        let errors = project.validate().unwrap_err();
        assert_eq!(errors.messages("end_date"), [ONGOING_WITH_END]);
    }

    #[test]
    fn test_certification_expiring_before_issue_rejected() {
        let cert: Certification = serde_json::from_value(json!({
            "name": "CKA",
            "issuing_organization": "CNCF",
            "issue_date": "2023-05-01",
            "expiration_date": "2022-05-01",
        }))
        .unwrap();
        let errors = cert.validate().unwrap_err();
        assert!(errors.contains("expiration_date"));
    }

    #[test]
    fn test_education_end_before_start_rejected() {
        let edu: Education = serde_json::from_value(json!({
            "institution": "MIT",
            "degree": "BSc",
            "start_date": "2019-09-01",
            "end_date": "2018-06-01",
        }))
        .unwrap();
        assert!(edu.validate().unwrap_err().contains("end_date"));
    }

    #[test]
    fn test_skill_defaults_and_choices() {
        let skill: Skill = serde_json::from_value(json!({ "name": "Rust" })).unwrap();
        assert_eq!(skill.category, "technical");
        assert_eq!(skill.proficiency, "intermediate");
        assert!(skill.validate().is_ok());

        let bad = Skill {
            category: "magic".into(),
            years_experience: Some(-2),
            ..skill
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.contains("category"));
        assert!(errors.contains("years_experience"));
    }

    #[test]
    fn test_reference_email_optional_but_checked() {
        let mut reference: Reference =
            serde_json::from_value(json!({ "name": "Grace Hopper" })).unwrap();
        assert!(reference.validate().is_ok());
        reference.email = "not-an-email".into();
        assert!(reference.validate().unwrap_err().contains("email"));
    }

    #[test]
    fn test_summary_word_limit() {
        let mut info: PersonalInfo = serde_json::from_value(json!({
            "full_name": "Ada Lovelace",
            "email": "ada@example.com",
        }))
        .unwrap();
        assert!(info.validate().is_ok());
        info.professional_summary = "word ".repeat(SUMMARY_MAX_WORDS + 1);
        assert!(info
            .validate()
            .unwrap_err()
            .contains("professional_summary"));
    }

    #[test]
    fn test_section_row_flattens_data_with_order() {
        let row = SectionRow {
            id: 7,
            resume_id: Uuid::nil(),
            order: 2,
            data: Language {
                name: "French".into(),
                proficiency: "native".into(),
                is_featured: false,
            },
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["order"], 2);
        assert_eq!(value["name"], "French");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_columns_match_serialized_fields() {
        fn assert_columns<T: Section>(sample: serde_json::Value) {
            let value = serde_json::to_value(serde_json::from_value::<T>(sample).unwrap()).unwrap();
            let fields = value.as_object().unwrap();
            assert_eq!(fields.len(), T::COLUMNS.len(), "{}", T::TABLE);
            for column in T::COLUMNS {
                assert!(fields.contains_key(*column), "{} missing {column}", T::TABLE);
            }
        }

        assert_columns::<Experience>(
            json!({"company": "a", "position": "b", "start_date": "2020-01-01"}),
        );
        assert_columns::<Education>(
            json!({"institution": "a", "degree": "b", "start_date": "2020-01-01"}),
        );
        assert_columns::<Skill>(json!({"name": "a"}));
        assert_columns::<Project>(json!({"title": "a", "start_date": "2020-01-01"}));
        assert_columns::<Certification>(
            json!({"name": "a", "issuing_organization": "b", "issue_date": "2020-01-01"}),
        );
        assert_columns::<Language>(json!({"name": "a"}));
        assert_columns::<Award>(json!({"title": "a", "issuer": "b", "date": "2020-01-01"}));
        assert_columns::<Publication>(
            json!({"title": "a", "authors": "b", "publication": "c", "date": "2020-01-01"}),
        );
        assert_columns::<Reference>(json!({"name": "a"}));
        assert_columns::<Volunteer>(
            json!({"organization": "a", "role": "b", "start_date": "2020-01-01"}),
        );
    }

    fn award(extra: serde_json::Value) -> Award {
        let mut body = json!({
            "title": "Best Paper",
            "issuer": "ACM",
            "date": "2022-05-01",
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_award_defaults() {
        let award = award(json!({}));
        assert_eq!(award.category, "professional");
        assert_eq!(award.prestige_level, "organizational");
        assert_eq!(award.currency, "USD");
        assert!(award.validate().is_ok());
    }

    #[test]
    fn test_award_numeric_rules() {
        let errors = award(json!({ "monetary_value": -5.0, "competition_size": 0 }))
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.messages("monetary_value"),
            ["Monetary value cannot be negative"]
        );
        assert_eq!(
            errors.messages("competition_size"),
            ["Competition size must be at least 1"]
        );
    }

    #[test]
    fn test_recurring_award_needs_frequency() {
        let errors = award(json!({ "is_recurring": true })).validate().unwrap_err();
        assert!(errors.contains("recurrence_frequency"));
        assert!(award(json!({ "is_recurring": true, "recurrence_frequency": "annual" }))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_award_unknown_choices_rejected() {
        let errors = award(json!({ "category": "bravery", "prestige_level": "galactic" }))
            .validate()
            .unwrap_err();
        assert!(errors.contains("category"));
        assert!(errors.contains("prestige_level"));
    }

    #[test]
    fn test_award_statistics_rollup() {
        let awards = [
            award(json!({ "is_featured": true, "monetary_value": 1000.0 })),
            award(json!({ "category": "research", "prestige_level": "national", "monetary_value": 250.5 })),
            award(json!({ "is_recurring": true, "recurrence_frequency": "annual" })),
        ];
        let stats = AwardStatistics::from_awards(&awards);
        assert_eq!(stats.total_awards, 3);
        assert_eq!(stats.featured_awards, 1);
        assert_eq!(stats.awards_with_monetary_value, 2);
        assert_eq!(stats.total_monetary_value, 1250.5);
        assert_eq!(stats.recurring_awards, 1);
        assert_eq!(stats.by_category["professional"], 2);
        assert_eq!(stats.by_category["research"], 1);
        assert_eq!(stats.by_category["sales"], 0);
        assert_eq!(stats.by_category.len(), AWARD_CATEGORIES.len());
        assert_eq!(stats.by_prestige_level["national"], 1);
        assert_eq!(stats.by_prestige_level["organizational"], 2);
    }

    #[test]
    fn test_award_statistics_empty() {
        let stats = AwardStatistics::from_awards(std::iter::empty());
        assert_eq!(stats.total_awards, 0);
        assert_eq!(stats.total_monetary_value, 0.0);
        assert!(stats.by_prestige_level.values().all(|count| *count == 0));
    }

    #[test]
    fn test_duplicated_award_is_retitled_and_unfeatured() {
        let copy = award(json!({ "is_featured": true, "monetary_value": 10.0 })).duplicated();
        assert_eq!(copy.title, "Best Paper (Copy)");
        assert!(!copy.is_featured);
        assert_eq!(copy.monetary_value, Some(10.0));
    }

    fn volunteer(extra: serde_json::Value) -> Volunteer {
        let mut body = json!({
            "organization": "Food Bank",
            "role": "Coordinator",
            "start_date": "2021-01-01",
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_volunteer_defaults_to_community() {
        let entry = volunteer(json!({}));
        assert_eq!(entry.category, "community");
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_volunteer_date_rules() {
        let errors = volunteer(json!({ "end_date": "2020-01-01" }))
            .validate()
            .unwrap_err();
        assert_eq!(errors.messages("end_date"), [END_BEFORE_START]);

        let errors = volunteer(json!({ "end_date": "2022-01-01", "is_ongoing": true }))
            .validate()
            .unwrap_err();
        assert_eq!(errors.messages("end_date"), [ONGOING_WITH_END]);
    }

    #[test]
    fn test_volunteer_hours_bounds() {
        let errors = volunteer(json!({ "hours_per_week": 169, "total_hours": -1 }))
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.messages("hours_per_week"),
            ["Hours per week cannot exceed 168"]
        );
        assert!(errors.contains("total_hours"));
        assert!(volunteer(json!({ "hours_per_week": 168 })).validate().is_ok());
    }
}
