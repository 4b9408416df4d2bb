//! Core logic for personal biomarker tracking.
//!
//! Users record measurements against predefined categories; each read derives
//! whether the value sits inside the category's reference range and inside
//! the applicable personal or default target range.

pub mod config;
pub mod db;
pub mod eval;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use eval::{
    evaluate, Evaluation, MeasurementStatus, ReferenceRangeStatus, ResolvedTarget,
    TargetRangeCheck, TargetSource,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{BiomarkerCategory, CategoryId};
pub use model::record::{BiomarkerRecord, RecordId};
pub use model::target::{TargetId, UserBiomarkerTarget};
pub use model::user::UserRef;
pub use model::validation::ValidationError;
pub use repo::category_repo::{
    CategoryDependents, CategoryListQuery, CategoryRepository, SqliteCategoryRepository,
};
pub use repo::error::{Conflict, EntityKind, RepoError, RepoResult};
pub use repo::record_repo::{RecordListQuery, RecordRepository, SqliteRecordRepository};
pub use repo::target_repo::{SqliteTargetRepository, TargetListQuery, TargetRepository};
pub use repo::user_data::{purge_user_data, UserPurge};
pub use service::category_service::CategoryService;
pub use service::record_service::{RecordService, RecordView};
pub use service::target_service::TargetService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
