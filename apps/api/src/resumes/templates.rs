use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview_url: &'static str,
    pub color_schemes: &'static [&'static str],
    pub features: &'static [&'static str],
}

pub const TEMPLATES: &[TemplateInfo] = &[
    TemplateInfo {
        id: "modern",
        name: "Modern Professional",
        description: "Clean, contemporary design perfect for tech and creative roles",
        preview_url: "/static/templates/modern_preview.png",
        color_schemes: &["blue", "green", "purple", "red"],
        features: &["ATS-friendly", "Clean layout", "Modern typography"],
    },
    TemplateInfo {
        id: "classic",
        name: "Classic Professional",
        description: "Traditional format suitable for conservative industries",
        preview_url: "/static/templates/classic_preview.png",
        color_schemes: &["black", "navy", "dark-gray"],
        features: &[
            "Traditional format",
            "Professional appearance",
            "Wide compatibility",
        ],
    },
    TemplateInfo {
        id: "creative",
        name: "Creative Portfolio",
        description: "Eye-catching design for creative professionals",
        preview_url: "/static/templates/creative_preview.png",
        color_schemes: &["orange", "teal", "pink", "yellow"],
        features: &["Creative layout", "Visual elements", "Portfolio integration"],
    },
    TemplateInfo {
        id: "minimal",
        name: "Minimal Clean",
        description: "Minimalist design focusing on content clarity",
        preview_url: "/static/templates/minimal_preview.png",
        color_schemes: &["gray", "black", "blue-gray"],
        features: &["Minimal design", "Focus on content", "Easy to read"],
    },
    TemplateInfo {
        id: "executive",
        name: "Executive Leadership",
        description: "Sophisticated design for senior-level positions",
        preview_url: "/static/templates/executive_preview.png",
        color_schemes: &["navy", "charcoal", "burgundy"],
        features: &[
            "Executive styling",
            "Leadership focus",
            "Professional imagery",
        ],
    },
];

/// GET /api/v1/templates
pub async fn list_templates() -> Json<&'static [TemplateInfo]> {
    Json(TEMPLATES)
}
