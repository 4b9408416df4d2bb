//! Timestamped biomarker measurements.
//!
//! # Invariants
//! - `value` is any finite number; range membership is never checked on write.
//! - `date_recorded` is user supplied and unrelated to `created_at`.
//! - Display order is `date_recorded DESC`.

use super::category::{BiomarkerCategory, CategoryId};
use super::user::UserRef;
use super::validation::{require_finite, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RecordId = Uuid;

/// One measurement entered by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerRecord {
    pub id: RecordId,
    pub user: UserRef,
    pub category_id: CategoryId,
    pub value: f64,
    /// Unix epoch milliseconds of the measurement itself.
    pub date_recorded: i64,
    pub notes: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl BiomarkerRecord {
    pub fn new(user: UserRef, category_id: CategoryId, value: f64, date_recorded: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            category_id,
            value,
            date_recorded,
            notes: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_finite("value", self.value)
    }

    /// Formats as `"{category}: {value} {unit} ({date})"`.
    ///
    /// The category is passed in explicitly; records never load it lazily.
    pub fn display_with<'a>(&'a self, category: &'a BiomarkerCategory) -> RecordLabel<'a> {
        RecordLabel {
            record: self,
            category,
        }
    }
}

/// Human-readable label for a record in the context of its category.
pub struct RecordLabel<'a> {
    record: &'a BiomarkerRecord,
    category: &'a BiomarkerCategory,
}

impl Display for RecordLabel<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {} (",
            self.category.name, self.record.value, self.category.unit
        )?;
        match DateTime::<Utc>::from_timestamp_millis(self.record.date_recorded) {
            Some(recorded) => write!(f, "{})", recorded.date_naive()),
            None => write!(f, "invalid date {})", self.record.date_recorded),
        }
    }
}
