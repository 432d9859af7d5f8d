// Prompt templates for the AI routes. Placeholders are `{name}` and are filled
// with `str::replace`; every builder is deterministic for a given input.

use serde::Deserialize;

pub const WRITING_STYLES: &[&str] = &["professional", "creative", "executive", "technical"];

const COVER_LETTER_RESUME_CHARS: usize = 1000;
const COVER_LETTER_JD_CHARS: usize = 800;

pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Create a compelling professional summary for a resume based on this information:

Name: {name}
Experience Level: {experience_level}
Target Industry: {target_industry}
Target Role: {target_role}
Key Skills: {skills}
Years of Experience: {years_experience}

Write a 3-4 sentence professional summary that:
1. Highlights key qualifications and experience
2. Shows value proposition for the target role
3. Uses industry-relevant keywords
4. Maintains {style} tone

Return only the summary text, no additional formatting."#;

pub const EXPERIENCE_PROMPT_TEMPLATE: &str = r#"Enhance this job experience description to be more impactful and ATS-friendly:

Position: {position}
Company: {company}
Original Description: {description}

Please:
1. Rewrite using strong action verbs
2. Add quantifiable achievements where possible
3. Include relevant industry keywords
4. Structure with bullet points
5. Focus on results and impact
6. Keep a {style} tone

Return ONLY a JSON object with this exact schema:
{
  "enhanced_description": "enhanced text",
  "achievements": ["achievement 1", "achievement 2"],
  "keywords_added": ["keyword1", "keyword2"],
  "suggestions": ["suggestion 1", "suggestion 2"]
}"#;

pub const JOB_MATCH_PROMPT_TEMPLATE: &str = r#"Analyze how well this resume matches the job description.

RESUME:
{resume_text}

JOB TITLE: {job_title}

JOB DESCRIPTION:
{job_description}

Return ONLY a JSON object with this exact schema:
{
  "match_score": 0-100,
  "extracted_keywords": ["keyword1", "keyword2"],
  "missing_skills": ["skill1", "skill2"],
  "strengths": ["strength1", "strength2"],
  "improvement_areas": ["area1", "area2"],
  "optimization_suggestions": ["suggestion1", "suggestion2"]
}"#;

pub const SKILLS_PROMPT_TEMPLATE: &str = r#"Suggest the most relevant and in-demand skills for:
Industry: {industry}
Role: {role}

Provide 15-20 skills categorized by type. Return ONLY a JSON object:
{
  "technical_skills": [
    {"name": "skill", "importance": 1-5, "trend": "rising/stable/declining"}
  ],
  "soft_skills": [
    {"name": "skill", "importance": 1-5, "description": "brief desc"}
  ],
  "tools_software": [
    {"name": "tool", "category": "category", "market_demand": 1-5}
  ]
}"#;

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a compelling cover letter based on:

RESUME SUMMARY:
{resume_text}

JOB DESCRIPTION:
{job_description}

COMPANY: {company}

Create a cover letter that:
1. Opens with enthusiasm for the specific role
2. Highlights relevant experience from the resume
3. Shows knowledge of the company/role
4. Demonstrates value proposition
5. Ends with strong call to action

Keep it to 3-4 paragraphs, {style} tone."#;

pub const ATS_PROMPT_TEMPLATE: &str = r#"You are an Applicant Tracking System. Scan this resume as an ATS would.

RESUME:
{resume_text}

Score each dimension from 0 to 100. Return ONLY a JSON object:
{
  "overall_score": 0-100,
  "keyword_score": 0-100,
  "format_score": 0-100,
  "readability_score": 0-100,
  "section_analysis": {"section name": "finding"},
  "recommendations": ["recommendation 1", "recommendation 2"]
}"#;

/// Inputs for the summary prompt. Only presence is checked; blanks render as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SummaryProfile {
    pub name: String,
    pub experience_level: String,
    pub target_industry: String,
    pub target_role: String,
    pub skills: Vec<String>,
    pub years_experience: u32,
}

fn style_or_default(style: &str) -> &str {
    if style.trim().is_empty() {
        "professional"
    } else {
        style
    }
}

/// Char-boundary-safe prefix.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_summary_prompt(profile: &SummaryProfile, style: &str) -> String {
    let experience_level = if profile.experience_level.is_empty() {
        "mid"
    } else {
        &profile.experience_level
    };
    SUMMARY_PROMPT_TEMPLATE
        .replace("{name}", &profile.name)
        .replace("{experience_level}", experience_level)
        .replace("{target_industry}", &profile.target_industry)
        .replace("{target_role}", &profile.target_role)
        .replace("{skills}", &profile.skills.join(", "))
        .replace("{years_experience}", &profile.years_experience.to_string())
        .replace("{style}", style_or_default(style))
}

pub fn build_experience_prompt(
    position: &str,
    company: &str,
    description: &str,
    style: &str,
) -> String {
    EXPERIENCE_PROMPT_TEMPLATE
        .replace("{position}", position)
        .replace("{company}", company)
        .replace("{description}", description)
        .replace("{style}", style_or_default(style))
}

pub fn build_job_match_prompt(resume_text: &str, job_title: &str, job_description: &str) -> String {
    JOB_MATCH_PROMPT_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{job_title}", job_title)
        .replace("{job_description}", job_description)
}

pub fn build_skills_prompt(industry: &str, role: &str) -> String {
    SKILLS_PROMPT_TEMPLATE
        .replace("{industry}", industry)
        .replace("{role}", role)
}

pub fn build_cover_letter_prompt(
    resume_text: &str,
    job_description: &str,
    company: &str,
    style: &str,
) -> String {
    COVER_LETTER_PROMPT_TEMPLATE
        .replace(
            "{resume_text}",
            truncate_chars(resume_text, COVER_LETTER_RESUME_CHARS),
        )
        .replace(
            "{job_description}",
            truncate_chars(job_description, COVER_LETTER_JD_CHARS),
        )
        .replace("{company}", company)
        .replace("{style}", style_or_default(style))
}

pub fn build_ats_prompt(resume_text: &str) -> String {
    ATS_PROMPT_TEMPLATE.replace("{resume_text}", resume_text)
}
