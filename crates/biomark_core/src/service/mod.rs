//! Use-case services over the biomarker stores.
//!
//! # Responsibility
//! - Orchestrate repository calls into create/read/update/delete use-cases.
//! - Load categories and targets explicitly before evaluating records.
//!
//! # Invariants
//! - Services never bypass repository validation.
//! - Derived range status is returned to callers and never persisted.

pub mod category_service;
pub mod record_service;
pub mod target_service;
