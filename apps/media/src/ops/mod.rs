//! Media operations. Each one is a pure, blocking transform from an optional
//! source file plus parameters to an output file; callers run them on the
//! blocking pool.

pub mod audio;
pub mod image;
pub mod text;
pub mod wav;

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Audio,
    Text,
    Image,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Audio, Family::Text, Family::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Audio => "audio",
            Family::Text => "text",
            Family::Image => "image",
        }
    }

    /// Operations applied to an uploaded file.
    pub fn file_operations(self) -> &'static [&'static str] {
        match self {
            Family::Audio => audio::FILE_OPERATIONS,
            Family::Text => text::OPERATIONS,
            Family::Image => image::OPERATIONS,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| format!("Unknown media family '{s}'"))
    }
}

#[derive(Debug, Error)]
pub enum OpError {
    #[error("Unsupported operation '{operation}' for {family}")]
    Unsupported { family: Family, operation: String },

    #[error("Operation '{0}' requires a source file")]
    MissingSource(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Wav(#[from] wav::WavError),

    #[error("Image error: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("Could not encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Produced file plus metadata merged into the job record.
#[derive(Debug, Clone)]
pub struct Output {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub metadata: Value,
}

impl Output {
    pub fn json(report: &Value) -> Result<Self, OpError> {
        Ok(Output {
            bytes: serde_json::to_vec_pretty(report)?,
            extension: "json",
            metadata: Value::Null,
        })
    }
}

/// Read-only view over a job's `parameters` object with typed defaults.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a>(Option<&'a Map<String, Value>>);

impl<'a> Params<'a> {
    pub fn new(value: &'a Value) -> Self {
        Params(value.as_object())
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.0
            .and_then(|m| m.get(key))
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        self.0
            .and_then(|m| m.get(key))
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(default)
    }

    pub fn str_or(&self, key: &str, default: &'a str) -> &'a str {
        self.0
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    /// String entries of an array parameter; other entries are skipped.
    pub fn str_list(&self, key: &str) -> Vec<&'a str> {
        self.0
            .and_then(|m| m.get(key))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Checks that `operation` exists for the family before a job is registered.
pub fn validate_operation(family: Family, operation: &str, with_source: bool) -> Result<(), OpError> {
    let known = if with_source {
        family.file_operations().contains(&operation)
    } else {
        match family {
            Family::Audio => audio::SYNTH_OPERATIONS.contains(&operation),
            Family::Text => text::OPERATIONS.contains(&operation),
            Family::Image => false,
        }
    };
    if known {
        Ok(())
    } else {
        Err(OpError::Unsupported {
            family,
            operation: operation.to_string(),
        })
    }
}

pub fn run(
    family: Family,
    operation: &str,
    params: &Value,
    source: Option<&[u8]>,
) -> Result<Output, OpError> {
    let params = Params::new(params);
    match family {
        Family::Audio => audio::run(operation, params, source),
        Family::Text => text::run(operation, params, source),
        Family::Image => {
            let source = source.ok_or_else(|| OpError::MissingSource(operation.to_string()))?;
            image::run(operation, params, source)
        }
    }
}
