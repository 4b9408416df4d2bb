//! Write-time validation errors and helpers.
//!
//! Every store runs these checks before SQL mutations; a failed check blocks
//! the write entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Rejection reason for an invalid category, target or record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// Text field exceeds its storage limit.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Numeric field is NaN or infinite.
    NonFinite(&'static str),
    /// Both reference bounds are set and `min > max`.
    InvertedReferenceRange { min: f64, max: f64 },
    /// Default target falls outside a configured reference bound.
    TargetOutsideReferenceRange {
        target: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Deviation allowance below zero.
    NegativeAcceptableRange { field: &'static str, value: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "`{field}` must be at most {max_chars} characters, got {actual_chars}"
            ),
            Self::NonFinite(field) => write!(f, "`{field}` must be a finite number"),
            Self::InvertedReferenceRange { min, max } => write!(
                f,
                "reference range minimum {min} is greater than maximum {max}"
            ),
            Self::TargetOutsideReferenceRange { target, min, max } => write!(
                f,
                "target value {target} must be within reference range [{}, {}]",
                format_bound(*min),
                format_bound(*max)
            ),
            Self::NegativeAcceptableRange { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}

fn format_bound(bound: Option<f64>) -> String {
    bound.map_or_else(|| "unbounded".to_string(), |value| value.to_string())
}

/// Trims a display label and collapses inner whitespace runs to one space.
pub fn normalize_label(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(field))
    }
}

pub(crate) fn require_finite_opt(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |value| require_finite(field, value))
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeAcceptableRange { field, value });
    }
    Ok(())
}
