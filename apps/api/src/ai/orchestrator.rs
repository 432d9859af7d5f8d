//! AI orchestration: which provider serves which task, how replies are parsed,
//! and what each task degrades to when the provider fails.
//!
//! Generation tasks (summary, experience, skills, cover letter) never fail:
//! they return a fixed fallback. Analysis tasks (job match, ATS scan) persist
//! results, so their failures are returned to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::ai::cache::{suggestion_cache_key, SuggestionCache, SUGGESTION_TTL};
use crate::ai::prompts::{
    build_ats_prompt, build_cover_letter_prompt, build_experience_prompt,
    build_job_match_prompt, build_skills_prompt, build_summary_prompt, SummaryProfile,
};
use crate::llm_client::{CompletionOptions, LlmClient, LlmError, Provider};
use crate::models::resume::ResumeDetail;

pub const SUMMARY_FALLBACK: &str = "Experienced professional with a proven track record of success.";
pub const COVER_LETTER_FALLBACK: &str = "Unable to generate cover letter at this time.";

const SUMMARY_OPTIONS: CompletionOptions = CompletionOptions::new(200, 0.7);
const EXPERIENCE_OPTIONS: CompletionOptions = CompletionOptions::new(500, 0.7);
const JOB_MATCH_OPTIONS: CompletionOptions = CompletionOptions::new(1000, 0.3);
const SKILLS_OPTIONS: CompletionOptions = CompletionOptions::new(800, 0.3);
const COVER_LETTER_OPTIONS: CompletionOptions = CompletionOptions::new(600, 0.7);
const ATS_OPTIONS: CompletionOptions = CompletionOptions::new(1000, 0.2);

// ────────────────────────────────────────────────────────────────────────────
// Reply shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEnhancement {
    pub enhanced_description: String,
    pub achievements: Vec<String>,
    pub keywords_added: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Skill suggestions by category. Entries are passed through as the model
/// produced them (name plus category-specific ratings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillSuggestions {
    pub technical_skills: Vec<Value>,
    pub soft_skills: Vec<Value>,
    pub tools_software: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMatchAnalysis {
    pub match_score: f64,
    pub extracted_keywords: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub optimization_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsScan {
    pub overall_score: f64,
    pub keyword_score: f64,
    pub format_score: f64,
    pub readability_score: f64,
    pub section_analysis: Value,
    pub recommendations: Vec<String>,
}

/// Model-reported scores are clamped into [0, 100]; NaN becomes 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

impl JobMatchAnalysis {
    fn clamped(mut self) -> Self {
        self.match_score = clamp_score(self.match_score);
        self
    }
}

impl AtsScan {
    fn clamped(mut self) -> Self {
        self.overall_score = clamp_score(self.overall_score);
        self.keyword_score = clamp_score(self.keyword_score);
        self.format_score = clamp_score(self.format_score);
        self.readability_score = clamp_score(self.readability_score);
        if !self.section_analysis.is_object() {
            self.section_analysis = Value::Object(Default::default());
        }
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation tasks (never fail)
// ────────────────────────────────────────────────────────────────────────────

/// OpenAI. Falls back to a fixed sentence; the resume itself is never written.
pub async fn generate_summary(llm: &LlmClient, profile: &SummaryProfile, style: &str) -> String {
    let prompt = build_summary_prompt(profile, style);
    llm.request_completion(&prompt, Provider::OpenAi, SUMMARY_OPTIONS, SUMMARY_FALLBACK)
        .await
}

/// Anthropic, JSON reply. Falls back to echoing the original description.
pub async fn enhance_experience(
    llm: &LlmClient,
    position: &str,
    company: &str,
    description: &str,
    style: &str,
) -> ExperienceEnhancement {
    let prompt = build_experience_prompt(position, company, description, style);
    match llm
        .complete_json::<ExperienceEnhancement>(&prompt, Provider::Anthropic, EXPERIENCE_OPTIONS)
        .await
    {
        Ok(enhanced) => enhanced,
        Err(e) => {
            warn!("experience enhancement failed, echoing original: {e}");
            ExperienceEnhancement {
                enhanced_description: description.to_string(),
                ..Default::default()
            }
        }
    }
}

/// DeepSeek, memoised for 24h per (industry, role). Failures are not cached.
pub async fn suggest_skills(
    llm: &LlmClient,
    cache: &dyn SuggestionCache,
    industry: &str,
    role: &str,
) -> SkillSuggestions {
    let key = suggestion_cache_key(industry, role);

    if let Some(cached) = cache.get(&key).await {
        match serde_json::from_str::<SkillSuggestions>(&cached) {
            Ok(suggestions) => return suggestions,
            Err(e) => warn!(%key, "discarding unreadable cached suggestions: {e}"),
        }
    }

    let prompt = build_skills_prompt(industry, role);
    let suggestions = match llm
        .complete_json::<SkillSuggestions>(&prompt, Provider::DeepSeek, SKILLS_OPTIONS)
        .await
    {
        Ok(suggestions) => suggestions,
        Err(e) => {
            warn!(%key, "skill suggestion failed: {e}");
            return SkillSuggestions::default();
        }
    };

    match serde_json::to_string(&suggestions) {
        Ok(raw) => cache.put(&key, raw, SUGGESTION_TTL).await,
        Err(e) => warn!(%key, "could not serialise suggestions for cache: {e}"),
    }
    info!(%key, "skill suggestions cached");
    suggestions
}

/// OpenAI. Falls back to a fixed apology.
pub async fn generate_cover_letter(
    llm: &LlmClient,
    resume_text: &str,
    job_description: &str,
    company: &str,
    style: &str,
) -> String {
    let prompt = build_cover_letter_prompt(resume_text, job_description, company, style);
    llm.request_completion(
        &prompt,
        Provider::OpenAi,
        COVER_LETTER_OPTIONS,
        COVER_LETTER_FALLBACK,
    )
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis tasks (errors surface)
// ────────────────────────────────────────────────────────────────────────────

pub async fn analyze_job_match(
    llm: &LlmClient,
    resume_text: &str,
    job_title: &str,
    job_description: &str,
) -> Result<JobMatchAnalysis, LlmError> {
    let prompt = build_job_match_prompt(resume_text, job_title, job_description);
    let analysis: JobMatchAnalysis = llm
        .complete_json(&prompt, Provider::Anthropic, JOB_MATCH_OPTIONS)
        .await?;
    Ok(analysis.clamped())
}

pub async fn scan_ats(llm: &LlmClient, resume_text: &str) -> Result<AtsScan, LlmError> {
    let prompt = build_ats_prompt(resume_text);
    let scan: AtsScan = llm
        .complete_json(&prompt, Provider::Anthropic, ATS_OPTIONS)
        .await?;
    Ok(scan.clamped())
}

// ────────────────────────────────────────────────────────────────────────────
// generate-content dispatch
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSection {
    Summary,
    Experience,
    Skills,
    CoverLetter,
}

fn default_style() -> String {
    "professional".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentRequest {
    pub section: ContentSection,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub target_industry: Option<String>,
    #[serde(default)]
    pub target_role: Option<String>,
    #[serde(default = "default_style")]
    pub writing_style: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExperienceContext {
    position: String,
    company: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CoverLetterContext {
    job_description: String,
    company_name: String,
}

/// Context keys win over values derived from the stored resume.
fn context_as<T: Default + for<'de> Deserialize<'de>>(context: &Value) -> T {
    if context.is_null() {
        return T::default();
    }
    serde_json::from_value(context.clone()).unwrap_or_else(|e| {
        warn!("ignoring malformed generation context: {e}");
        T::default()
    })
}

fn pick(explicit: Option<&str>, fallback: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn summary_profile(
    detail: &ResumeDetail,
    req: &GenerateContentRequest,
) -> SummaryProfile {
    let mut profile: SummaryProfile = context_as(&req.context);
    if profile.name.is_empty() {
        if let Some(info) = &detail.personal_info {
            profile.name = info.full_name.clone();
        }
    }
    if profile.experience_level.is_empty() {
        profile.experience_level = detail.resume.experience_level.clone();
    }
    if profile.target_industry.is_empty() {
        profile.target_industry =
            pick(req.target_industry.as_deref(), &detail.resume.target_industry);
    }
    if profile.target_role.is_empty() {
        profile.target_role = pick(req.target_role.as_deref(), &detail.resume.target_role);
    }
    if profile.skills.is_empty() {
        profile.skills = detail.skills.iter().map(|s| s.data.name.clone()).collect();
    }
    profile
}

/// Runs one generation task. The result is JSON: a string for summary and
/// cover letter, an object for experience and skills.
pub async fn generate_content(
    llm: &LlmClient,
    cache: &dyn SuggestionCache,
    detail: &ResumeDetail,
    req: &GenerateContentRequest,
) -> Value {
    let style = req.writing_style.as_str();
    match req.section {
        ContentSection::Summary => {
            let profile = summary_profile(detail, req);
            Value::String(generate_summary(llm, &profile, style).await)
        }
        ContentSection::Experience => {
            let ctx: ExperienceContext = context_as(&req.context);
            let enhanced =
                enhance_experience(llm, &ctx.position, &ctx.company, &ctx.description, style)
                    .await;
            serde_json::to_value(enhanced).unwrap_or(Value::Null)
        }
        ContentSection::Skills => {
            let industry = pick(req.target_industry.as_deref(), &detail.resume.target_industry);
            let role = pick(req.target_role.as_deref(), &detail.resume.target_role);
            let suggestions = suggest_skills(llm, cache, &industry, &role).await;
            serde_json::to_value(suggestions).unwrap_or(Value::Null)
        }
        ContentSection::CoverLetter => {
            let ctx: CoverLetterContext = context_as(&req.context);
            let letter = generate_cover_letter(
                llm,
                &detail.to_plain_text(),
                &ctx.job_description,
                &ctx.company_name,
                style,
            )
            .await;
            Value::String(letter)
        }
    }
}
