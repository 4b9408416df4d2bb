//! Personal biomarker targets.
//!
//! # Invariants
//! - At most one target exists per `(user, category_id)` pair.
//! - `acceptable_range` is non-negative.

use super::category::CategoryId;
use super::user::UserRef;
use super::validation::{require_finite, require_non_negative, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TargetId = Uuid;

/// A user's own goal for one category, overriding the category default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBiomarkerTarget {
    pub id: TargetId,
    pub user: UserRef,
    pub category_id: CategoryId,
    pub target_value: f64,
    pub acceptable_range: f64,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl UserBiomarkerTarget {
    pub fn new(
        user: UserRef,
        category_id: CategoryId,
        target_value: f64,
        acceptable_range: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            category_id,
            target_value,
            acceptable_range,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_finite("target_value", self.target_value)?;
        require_non_negative("acceptable_range", self.acceptable_range)
    }
}
