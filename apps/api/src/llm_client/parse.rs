use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model returned an empty response")]
    Empty,

    #[error("model response is not the expected JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim()),
        None => text,
    }
}

/// Deserialises a model reply, tolerating a surrounding markdown fence.
pub fn parse_structured_response<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let body = strip_json_fences(raw);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}
