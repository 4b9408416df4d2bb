//! Store contracts and SQLite implementations.
//!
//! # Responsibility
//! - CategoryStore, TargetStore and RecordStore persistence APIs.
//! - Map SQLite constraint failures to semantic conflict/not-found errors.
//!
//! # Invariants
//! - Write paths validate before SQL mutations.
//! - Uniqueness is enforced by insert-or-fail, never read-then-write.
//! - Read paths reject invalid persisted state instead of masking it.

mod common;
pub mod category_repo;
pub mod error;
pub mod record_repo;
pub mod target_repo;
pub mod user_data;
