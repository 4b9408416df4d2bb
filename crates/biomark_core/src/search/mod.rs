//! Free-text search helpers shared by list/search views.
//!
//! # Responsibility
//! - Turn user query text into a parameterized SQL filter.
//! - Keep search semantics identical across category and record stores.

pub mod text;
