//! Declarative field checks shared by the resume and section controllers.
//!
//! Checks never short-circuit: every failing field is collected into a
//! `FieldErrors` map so the client sees all problems in one 400 response.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

pub const END_BEFORE_START: &str = "End date cannot be before start date";
pub const CURRENT_WITH_END: &str = "Current position cannot have an end date";
pub const ONGOING_WITH_END: &str = "Ongoing entry cannot have an end date";
pub const EXPIRES_BEFORE_ISSUE: &str = "Expiration date cannot be before issue date";

/// Field name -> messages. Serialized as a plain JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Folds another error set in under `prefix`, e.g. `items[2].end_date`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn require_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field may not be blank");
    } else if trimmed.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters"),
        );
    }
}

pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters"),
        );
    }
}

pub fn check_choice(errors: &mut FieldErrors, field: &str, value: &str, choices: &[&str]) {
    if !choices.contains(&value) {
        errors.add(
            field,
            format!(
                "\"{value}\" is not a valid choice (expected one of: {})",
                choices.join(", ")
            ),
        );
    }
}

/// `end >= start` when both are present. The message lands on the end field.
pub fn check_date_order(
    errors: &mut FieldErrors,
    end_field: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    message: &str,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.add(end_field, message);
        }
    }
}

/// A "still running" flag and a populated end date are mutually exclusive.
pub fn check_open_ended(
    errors: &mut FieldErrors,
    end_field: &str,
    flag: bool,
    end: Option<NaiveDate>,
    message: &str,
) {
    if flag && end.is_some() {
        errors.add(end_field, message);
    }
}

pub fn check_non_negative(errors: &mut FieldErrors, field: &str, value: Option<i32>) {
    if matches!(value, Some(v) if v < 0) {
        errors.add(field, "Ensure this value is greater than or equal to 0");
    }
}

pub fn check_score(errors: &mut FieldErrors, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if !(0.0..=100.0).contains(&v) || v.is_nan() {
            errors.add(field, "Score must be between 0 and 100");
        }
    }
}

pub fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    let value = value.trim();
    let valid = value
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid {
        errors.add(field, "Enter a valid email address");
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
