//! Biomarker category definitions.
//!
//! # Invariants
//! - `name` is non-blank, at most 100 chars, unique case-insensitively.
//! - `unit` is non-blank and at most 20 chars.
//! - When both reference bounds are set, `reference_range_min <= reference_range_max`.
//! - A set `default_target_value` lies inside every set reference bound.
//! - `default_acceptable_range`, when set, is non-negative.

use super::validation::{
    normalize_label, require_finite_opt, require_non_negative, require_text, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CategoryId = Uuid;

pub const CATEGORY_NAME_MAX_CHARS: usize = 100;
pub const CATEGORY_UNIT_MAX_CHARS: usize = 20;

/// Definition of one measurable biomarker, e.g. "LDL Cholesterol" in mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub unit: String,
    /// Lower medical reference bound. `None` means unbounded below.
    pub reference_range_min: Option<f64>,
    /// Upper medical reference bound. `None` means unbounded above.
    pub reference_range_max: Option<f64>,
    /// Fallback goal for users without a personal target.
    pub default_target_value: Option<f64>,
    /// Allowed deviation around `default_target_value`.
    pub default_acceptable_range: Option<f64>,
    /// Epoch ms, set by storage and ignored on write.
    pub created_at: Option<i64>,
    /// Epoch ms, set by storage and ignored on write.
    pub updated_at: Option<i64>,
}

impl BiomarkerCategory {
    /// Creates an unbounded category with a generated id.
    pub fn new(name: impl AsRef<str>, unit: impl AsRef<str>) -> Self {
        Self::with_id(Uuid::new_v4(), name, unit)
    }

    /// Creates an unbounded category with a caller-provided id.
    pub fn with_id(id: CategoryId, name: impl AsRef<str>, unit: impl AsRef<str>) -> Self {
        Self {
            id,
            name: normalize_label(name.as_ref()),
            description: String::new(),
            unit: unit.as_ref().trim().to_string(),
            reference_range_min: None,
            reference_range_max: None,
            default_target_value: None,
            default_acceptable_range: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reference_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.reference_range_min = min;
        self.reference_range_max = max;
        self
    }

    pub fn with_default_target(mut self, value: f64, acceptable_range: Option<f64>) -> Self {
        self.default_target_value = Some(value);
        self.default_acceptable_range = acceptable_range;
        self
    }

    /// Copy with the name whitespace-normalized and the unit trimmed.
    ///
    /// `name` and `unit` are public, so stores normalize again before writing.
    pub fn normalized(&self) -> Self {
        Self {
            name: normalize_label(&self.name),
            unit: self.unit.trim().to_string(),
            ..self.clone()
        }
    }

    /// Checks every category invariant.
    ///
    /// Stores call this on each create and update; it is not optional.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, CATEGORY_NAME_MAX_CHARS)?;
        require_text("unit", &self.unit, CATEGORY_UNIT_MAX_CHARS)?;
        require_finite_opt("reference_range_min", self.reference_range_min)?;
        require_finite_opt("reference_range_max", self.reference_range_max)?;
        require_finite_opt("default_target_value", self.default_target_value)?;
        if let Some(range) = self.default_acceptable_range {
            require_non_negative("default_acceptable_range", range)?;
        }

        if let (Some(min), Some(max)) = (self.reference_range_min, self.reference_range_max) {
            if min > max {
                return Err(ValidationError::InvertedReferenceRange { min, max });
            }
        }

        if let Some(target) = self.default_target_value {
            let below = self.reference_range_min.is_some_and(|min| target < min);
            let above = self.reference_range_max.is_some_and(|max| target > max);
            if below || above {
                return Err(ValidationError::TargetOutsideReferenceRange {
                    target,
                    min: self.reference_range_min,
                    max: self.reference_range_max,
                });
            }
        }

        Ok(())
    }
}

impl Display for BiomarkerCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
