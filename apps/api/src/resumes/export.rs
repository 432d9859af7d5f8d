//! Export requests. Only the link contract is provided here; rendering the
//! file behind the link is a separate concern.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt::Write;

use crate::models::resume::ResumeDetail;
use crate::validation::{check_choice, FieldErrors};

pub const EXPORT_FORMATS: &[&str] = &["pdf", "docx", "html"];
pub const PAGE_SIZES: &[&str] = &["A4", "Letter"];
pub const EXPORTABLE_SECTIONS: &[&str] = &[
    "personal_info",
    "experiences",
    "education",
    "skills",
    "projects",
    "certifications",
    "languages",
    "awards",
    "publications",
    "volunteer_experiences",
    "references",
];

const LINK_TTL_HOURS: i64 = 24;

fn default_format() -> String {
    "pdf".to_string()
}

fn default_page_size() -> String {
    "A4".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_page_size")]
    pub page_size: String,
    #[serde(default)]
    pub include_sections: Option<Vec<String>>,
}

impl ExportRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        check_choice(&mut errors, "format", &self.format, EXPORT_FORMATS);
        check_choice(&mut errors, "page_size", &self.page_size, PAGE_SIZES);
        for section in self.include_sections.iter().flatten() {
            check_choice(&mut errors, "include_sections", section, EXPORTABLE_SECTIONS);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportLink {
    pub download_url: String,
    pub format: String,
    pub expires_at: DateTime<Utc>,
}

pub fn build_export_link(
    base_url: &str,
    resume_id: Uuid,
    format: &str,
    now: DateTime<Utc>,
) -> ExportLink {
    ExportLink {
        download_url: format!(
            "{}/api/v1/resumes/{resume_id}/download/{format}",
            base_url.trim_end_matches('/')
        ),
        format: format.to_string(),
        expires_at: now + Duration::hours(LINK_TTL_HOURS),
    }
}

/// Formats the download route can render itself.
pub const RENDERED_FORMATS: &[&str] = &["html"];

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn section(html: &mut String, heading: &str, entries: Vec<String>) {
    if entries.is_empty() {
        return;
    }
    let _ = write!(html, "<section><h2>{heading}</h2><ul>");
    for entry in entries {
        let _ = write!(html, "<li>{entry}</li>");
    }
    html.push_str("</ul></section>");
}

/// Standalone HTML document for a resume. Every user-supplied string is
/// escaped.
pub fn render_html(detail: &ResumeDetail) -> String {
    let title = escape(&detail.resume.title);
    let mut html = format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title></head><body>"
    );

    if let Some(info) = &detail.personal_info {
        let _ = write!(html, "<header><h1>{}</h1>", escape(&info.full_name));
        let contact: Vec<String> = [&info.email, &info.phone, &info.location, &info.website]
            .into_iter()
            .filter(|value| !value.trim().is_empty())
            .map(|value| escape(value))
            .collect();
        if !contact.is_empty() {
            let _ = write!(html, "<p>{}</p>", contact.join(" | "));
        }
        if !info.professional_summary.trim().is_empty() {
            let _ = write!(html, "<p>{}</p>", escape(&info.professional_summary));
        }
        html.push_str("</header>");
    } else {
        let _ = write!(html, "<header><h1>{title}</h1></header>");
    }

    section(
        &mut html,
        "Experience",
        detail
            .experiences
            .iter()
            .map(|row| {
                let exp = &row.data;
                let end = match (exp.is_current, exp.end_date) {
                    (true, _) => "Present".to_string(),
                    (false, Some(end)) => end.to_string(),
                    (false, None) => String::new(),
                };
                format!(
                    "<strong>{}</strong>, {} ({} to {end})<p>{}</p>",
                    escape(&exp.position),
                    escape(&exp.company),
                    exp.start_date,
                    escape(&exp.description)
                )
            })
            .collect(),
    );
    section(
        &mut html,
        "Education",
        detail
            .education
            .iter()
            .map(|row| {
                format!(
                    "<strong>{}</strong>, {}",
                    escape(&row.data.degree),
                    escape(&row.data.institution)
                )
            })
            .collect(),
    );
    section(
        &mut html,
        "Skills",
        detail.skills.iter().map(|row| escape(&row.data.name)).collect(),
    );
    section(
        &mut html,
        "Projects",
        detail
            .projects
            .iter()
            .map(|row| escape(&row.data.title))
            .collect(),
    );
    section(
        &mut html,
        "Certifications",
        detail
            .certifications
            .iter()
            .map(|row| {
                format!(
                    "{} ({})",
                    escape(&row.data.name),
                    escape(&row.data.issuing_organization)
                )
            })
            .collect(),
    );
    section(
        &mut html,
        "Languages",
        detail
            .languages
            .iter()
            .map(|row| {
                format!(
                    "{} ({})",
                    escape(&row.data.name),
                    escape(&row.data.proficiency)
                )
            })
            .collect(),
    );
    section(
        &mut html,
        "Awards",
        detail
            .awards
            .iter()
            .map(|row| {
                format!(
                    "{}, {} ({})",
                    escape(&row.data.title),
                    escape(&row.data.issuer),
                    row.data.date
                )
            })
            .collect(),
    );
    section(
        &mut html,
        "Publications",
        detail
            .publications
            .iter()
            .map(|row| {
                format!(
                    "{}, {}",
                    escape(&row.data.title),
                    escape(&row.data.publication)
                )
            })
            .collect(),
    );
    section(
        &mut html,
        "Volunteering",
        detail
            .volunteer_experiences
            .iter()
            .map(|row| {
                format!(
                    "{}, {}",
                    escape(&row.data.role),
                    escape(&row.data.organization)
                )
            })
            .collect(),
    );

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeRow;
    use crate::models::sections::SectionRow;
    use serde_json::json;

    fn detail() -> ResumeDetail {
        ResumeDetail {
            resume: ResumeRow {
                id: Uuid::nil(),
                user_id: Uuid::nil(),
                title: "Backend <CV>".into(),
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
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            personal_info: None,
            experiences: vec![],
            education: vec![],
            skills: vec![],
            projects: vec![],
            certifications: vec![],
            languages: vec![],
            awards: vec![],
            publications: vec![],
            volunteer_experiences: vec![],
            references: vec![],
        }
    }

    #[test]
    fn test_defaults_to_pdf_on_a4() {
        let req: ExportRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.format, "pdf");
        assert_eq!(req.page_size, "A4");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let req: ExportRequest = serde_json::from_value(json!({
            "format": "odt",
            "page_size": "Legal",
            "include_sections": ["skills", "hobbies"],
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.contains("format"));
        assert!(errors.contains("page_size"));
        assert_eq!(errors.messages("include_sections").len(), 1);
    }

    #[test]
    fn test_link_expires_a_day_later() {
        let id = Uuid::nil();
        let now = Utc::now();
        let link = build_export_link("https://cv.example.com/", id, "docx", now);
        assert_eq!(
            link.download_url,
            format!("https://cv.example.com/api/v1/resumes/{id}/download/docx")
        );
        assert_eq!(link.expires_at - now, Duration::hours(24));
    }

    #[test]
    fn test_html_escapes_user_text() {
        let mut detail = detail();
        detail.experiences.push(SectionRow {
            id: 1,
            resume_id: Uuid::nil(),
            order: 0,
            data: serde_json::from_value(json!({
                "company": "R&D \"Labs\"",
                "position": "<script>alert(1)</script>",
                "start_date": "2020-01-01",
                "is_current": true,
            }))
            .unwrap(),
        });
        let html = render_html(&detail);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Backend &lt;CV&gt;</title>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("R&amp;D &quot;Labs&quot;"));
        assert!(html.contains("2020-01-01 to Present"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_html_skips_empty_sections() {
        let mut detail = detail();
        detail.skills.push(SectionRow {
            id: 1,
            resume_id: Uuid::nil(),
            order: 0,
            data: serde_json::from_value(json!({ "name": "Rust" })).unwrap(),
        });
        let html = render_html(&detail);
        assert!(html.contains("<h2>Skills</h2><ul><li>Rust</li></ul>"));
        assert!(!html.contains("<h2>Experience</h2>"));
        assert!(html.contains("<h1>Backend &lt;CV&gt;</h1>"));
    }
}
