//! JSON body extraction that reports failures as `AppError` 400s.
//!
//! Deserialisation runs through `serde_path_to_error`, so a bad value is
//! reported under the field it came from (`start_date`, `items[1].end_date`)
//! in the same `fields` map the validators fill.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_json::{error::Category, Value};

use crate::errors::AppError;
use crate::validation::FieldErrors;

/// Drop-in for `axum::Json` on request bodies.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(AppError::Validation(
                "Expected request with `Content-Type: application/json`".to_string(),
            ));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        from_slice(&bytes).map(ApiJson)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(into_app_error)?;
    de.end()
        .map_err(|e| AppError::Validation(format!("Malformed JSON body: {e}")))?;
    Ok(value)
}

/// Deserialises an already-parsed body (e.g. a merged PATCH document).
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_path_to_error::deserialize(value).map_err(into_app_error)
}

fn into_app_error(err: serde_path_to_error::Error<serde_json::Error>) -> AppError {
    let path = err.path().to_string();
    let inner = err.into_inner();
    if matches!(inner.classify(), Category::Syntax | Category::Eof | Category::Io) {
        return AppError::Validation(format!("Malformed JSON body: {inner}"));
    }

    let message = without_position(&inner.to_string());
    let parent = (path != ".").then_some(path);
    let field = match (missing_field(&message), parent) {
        (Some(missing), Some(parent)) => Some(format!("{parent}.{missing}")),
        (Some(missing), None) => Some(missing.to_string()),
        (None, parent) => parent,
    };

    match field {
        Some(field) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            AppError::InvalidFields(errors)
        }
        None => AppError::Validation(message),
    }
}

/// serde_json appends ` at line L column C` to errors read from text.
fn without_position(message: &str) -> String {
    match message.rsplit_once(" at line ") {
        Some((head, _)) => head.to_string(),
        None => message.to_string(),
    }
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}
