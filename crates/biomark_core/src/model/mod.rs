//! Biomarker domain model.
//!
//! # Responsibility
//! - Define the three persisted record types: categories, personal targets
//!   and measurement records.
//! - Own write-time validation rules shared by every store.
//!
//! # Invariants
//! - Every persisted object is identified by a stable UUID.
//! - Users are opaque external references and are never interpreted.
//! - Range status is derived at read time and is never part of the model.

pub mod category;
pub mod record;
pub mod target;
pub mod user;
pub mod validation;
