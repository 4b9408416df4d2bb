//! Read-time range evaluation.
//!
//! # Responsibility
//! - Derive reference-range and target-range status for a measurement.
//!
//! # Invariants
//! - Evaluation is pure: inputs are loaded explicitly by callers and nothing
//!   is written back to storage.
//! - "No target configured" is a distinct outcome, never `false`.

pub mod range;

pub use range::{
    evaluate, is_within_reference_range, measurement_status, reference_range_status,
    resolve_target, target_range_check, Evaluation, MeasurementStatus, ReferenceRangeStatus,
    ResolvedTarget, TargetRangeCheck, TargetSource,
};
