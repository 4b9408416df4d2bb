//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::user::UserRef;
use crate::model::validation::ValidationError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persisted entity kinds, used to qualify not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Target,
    Record,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Category => "biomarker category",
            Self::Target => "biomarker target",
            Self::Record => "biomarker record",
        })
    }
}

/// Uniqueness rule violated by a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Another category already uses this name (case-insensitive).
    CategoryName(String),
    /// The user already has a target for this category.
    UserTarget {
        user: UserRef,
        category_id: CategoryId,
    },
    /// Primary key already taken.
    DuplicateId(Uuid),
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryName(name) => write!(f, "category name `{name}` already exists"),
            Self::UserTarget { user, category_id } => write!(
                f,
                "user `{user}` already has a target for category {category_id}"
            ),
            Self::DuplicateId(id) => write!(f, "id {id} already exists"),
        }
    }
}

#[derive(Debug)]
pub enum RepoError {
    /// Write rejected before reaching storage.
    Validation(ValidationError),
    /// Write rejected by a uniqueness constraint.
    Conflict(Conflict),
    /// Target of an update/delete, or a referenced category, does not exist.
    NotFound(EntityKind, Uuid),
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Connection was opened without `PRAGMA foreign_keys = ON`.
    ForeignKeysDisabled,
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Conflict(conflict) => write!(f, "conflict: {conflict}"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "biomarker stores require schema version {expected_version}, got {actual_version}"
            ),
            Self::ForeignKeysDisabled => {
                write!(f, "biomarker stores require `PRAGMA foreign_keys = ON`")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "biomarker stores require table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "biomarker stores require column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Constraint family of a failed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey,
}

pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != rusqlite::ErrorCode::ConstraintViolation {
        return None;
    }
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE => Some(ConstraintKind::Unique),
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(ConstraintKind::PrimaryKey),
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
        _ => None,
    }
}
