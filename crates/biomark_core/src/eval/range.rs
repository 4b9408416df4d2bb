//! Reference-range and target-range checks.

use crate::model::category::BiomarkerCategory;
use crate::model::target::UserBiomarkerTarget;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Position of a value relative to the category's reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRangeStatus {
    Within,
    Below,
    Above,
}

impl ReferenceRangeStatus {
    pub fn is_within(self) -> bool {
        self == Self::Within
    }
}

/// Where the applied target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    Personal,
    CategoryDefault,
}

/// Target and deviation that apply to one user's measurements of a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedTarget {
    pub target_value: f64,
    pub acceptable_range: f64,
    pub source: TargetSource,
}

impl ResolvedTarget {
    /// `|value - target_value| <= acceptable_range`.
    pub fn contains(&self, value: f64) -> bool {
        (value - self.target_value).abs() <= self.acceptable_range
    }
}

/// Tri-state target membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRangeCheck {
    Within,
    Outside,
    NoTarget,
}

/// Combined display status for a measurement.
///
/// Reference-range violations take precedence over target classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStatus {
    BelowRange,
    AboveRange,
    AtTarget,
    BelowTarget,
    AboveTarget,
    WithinRange,
}

impl MeasurementStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::BelowRange => "Below Range",
            Self::AboveRange => "Above Range",
            Self::AtTarget => "At Target",
            Self::BelowTarget => "Below Target",
            Self::AboveTarget => "Above Target",
            Self::WithinRange => "Within Range",
        }
    }
}

impl Display for MeasurementStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Full read-time view of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub reference: ReferenceRangeStatus,
    pub target: TargetRangeCheck,
    pub resolved_target: Option<ResolvedTarget>,
    pub status: MeasurementStatus,
}

impl Evaluation {
    pub fn is_within_reference_range(&self) -> bool {
        self.reference.is_within()
    }
}

/// Classifies `value` against the category's reference bounds.
///
/// Absent bounds impose no constraint. The lower bound is checked first.
pub fn reference_range_status(category: &BiomarkerCategory, value: f64) -> ReferenceRangeStatus {
    if category.reference_range_min.is_some_and(|min| value < min) {
        return ReferenceRangeStatus::Below;
    }
    if category.reference_range_max.is_some_and(|max| value > max) {
        return ReferenceRangeStatus::Above;
    }
    ReferenceRangeStatus::Within
}

pub fn is_within_reference_range(category: &BiomarkerCategory, value: f64) -> bool {
    reference_range_status(category, value).is_within()
}

/// Picks the target that applies to a user's measurements.
///
/// Order: the personal target, then the category default when both
/// `default_target_value` and `default_acceptable_range` are set, else none.
/// A personal target belonging to another category is ignored.
pub fn resolve_target(
    category: &BiomarkerCategory,
    personal: Option<&UserBiomarkerTarget>,
) -> Option<ResolvedTarget> {
    if let Some(target) = personal.filter(|target| target.category_id == category.id) {
        return Some(ResolvedTarget {
            target_value: target.target_value,
            acceptable_range: target.acceptable_range,
            source: TargetSource::Personal,
        });
    }

    match (category.default_target_value, category.default_acceptable_range) {
        (Some(target_value), Some(acceptable_range)) => Some(ResolvedTarget {
            target_value,
            acceptable_range,
            source: TargetSource::CategoryDefault,
        }),
        _ => None,
    }
}

pub fn target_range_check(value: f64, target: Option<&ResolvedTarget>) -> TargetRangeCheck {
    match target {
        Some(target) if target.contains(value) => TargetRangeCheck::Within,
        Some(_) => TargetRangeCheck::Outside,
        None => TargetRangeCheck::NoTarget,
    }
}

/// Display status for `value`.
///
/// `target_value` only needs a goal, not a deviation: a category default
/// without `default_acceptable_range` still yields At/Below/Above Target.
pub fn measurement_status(
    reference: ReferenceRangeStatus,
    value: f64,
    target_value: Option<f64>,
) -> MeasurementStatus {
    match reference {
        ReferenceRangeStatus::Below => return MeasurementStatus::BelowRange,
        ReferenceRangeStatus::Above => return MeasurementStatus::AboveRange,
        ReferenceRangeStatus::Within => {}
    }

    let Some(target_value) = target_value else {
        return MeasurementStatus::WithinRange;
    };

    if value == target_value {
        MeasurementStatus::AtTarget
    } else if value < target_value {
        MeasurementStatus::BelowTarget
    } else {
        MeasurementStatus::AboveTarget
    }
}

/// Runs both checks for one value.
pub fn evaluate(
    category: &BiomarkerCategory,
    personal: Option<&UserBiomarkerTarget>,
    value: f64,
) -> Evaluation {
    let reference = reference_range_status(category, value);
    let resolved_target = resolve_target(category, personal);
    let goal = resolved_target
        .map(|target| target.target_value)
        .or(category.default_target_value);
    Evaluation {
        reference,
        target: target_range_check(value, resolved_target.as_ref()),
        resolved_target,
        status: measurement_status(reference, value, goal),
    }
}
