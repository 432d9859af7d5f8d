//! Heuristic resume score. Pure: counts in, breakdown out. No I/O.
//!
//! content quality = 50 + 10 (summary) + min(experiences × 10, 30) + 10 (skills > 5)
//! ATS             = 60 + 20 (any experience) + 10 (any skill) + 10 (any education)
//! completeness    = 20 personal info + 30 experience + 20 skills + 20 education
//!                   + 5 projects + 5 certifications
//! overall         = mean of the three
//!
//! Every component is capped at 100.

use serde::Serialize;

use crate::models::resume::ResumeDetail;

const MAX_SCORE: f64 = 100.0;

/// Section counts the score depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSnapshot {
    pub has_personal_info: bool,
    pub has_summary: bool,
    pub experience_count: usize,
    pub skill_count: usize,
    pub education_count: usize,
    pub project_count: usize,
    pub certification_count: usize,
}

impl From<&ResumeDetail> for ScoreSnapshot {
    fn from(detail: &ResumeDetail) -> Self {
        Self {
            has_personal_info: detail.personal_info.is_some(),
            has_summary: detail
                .personal_info
                .as_ref()
                .is_some_and(|p| !p.professional_summary.trim().is_empty()),
            experience_count: detail.experiences.len(),
            skill_count: detail.skills.len(),
            education_count: detail.education.len(),
            project_count: detail.projects.len(),
            certification_count: detail.certifications.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub overall_score: f64,
    pub content_quality: f64,
    pub ats_compatibility: f64,
    pub completeness: f64,
    pub recommendations: Vec<String>,
}

impl ScoreBreakdown {
    /// Response form: one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            overall_score: round1(self.overall_score),
            content_quality: round1(self.content_quality),
            ats_compatibility: round1(self.ats_compatibility),
            completeness: round1(self.completeness),
            recommendations: self.recommendations.clone(),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn content_quality(s: &ScoreSnapshot) -> f64 {
    let mut score: f64 = 50.0;
    if s.has_summary {
        score += 10.0;
    }
    score += (s.experience_count as f64 * 10.0).min(30.0);
    if s.skill_count > 5 {
        score += 10.0;
    }
    score.min(MAX_SCORE)
}

fn ats_compatibility(s: &ScoreSnapshot) -> f64 {
    let mut score: f64 = 60.0;
    if s.experience_count > 0 {
        score += 20.0;
    }
    if s.skill_count > 0 {
        score += 10.0;
    }
    if s.education_count > 0 {
        score += 10.0;
    }
    score.min(MAX_SCORE)
}

fn completeness(s: &ScoreSnapshot) -> f64 {
    let weighted = [
        (s.has_personal_info, 20.0),
        (s.experience_count > 0, 30.0),
        (s.skill_count > 0, 20.0),
        (s.education_count > 0, 20.0),
        (s.project_count > 0, 5.0),
        (s.certification_count > 0, 5.0),
    ];
    weighted
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum::<f64>()
        .min(MAX_SCORE)
}

fn recommendations(s: &ScoreSnapshot) -> Vec<String> {
    let mut out = Vec::new();
    if !s.has_summary {
        out.push("Add a compelling professional summary".to_string());
    }
    if s.experience_count < 2 {
        out.push("Add more work experience entries".to_string());
    }
    if s.skill_count < 8 {
        out.push("Add more relevant skills".to_string());
    }
    if s.project_count == 0 {
        out.push("Include relevant projects to showcase your work".to_string());
    }
    out
}

pub fn compute_resume_score(snapshot: &ScoreSnapshot) -> ScoreBreakdown {
    let content_quality = content_quality(snapshot);
    let ats_compatibility = ats_compatibility(snapshot);
    let completeness = completeness(snapshot);

    ScoreBreakdown {
        overall_score: (content_quality + ats_compatibility + completeness) / 3.0,
        content_quality,
        ats_compatibility,
        completeness,
        recommendations: recommendations(snapshot),
    }
}
