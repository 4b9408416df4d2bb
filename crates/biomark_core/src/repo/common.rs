//! Shared SQLite helpers for the biomarker stores.

use super::error::{RepoError, RepoResult};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::Connection;
use uuid::Uuid;

/// Current time in epoch milliseconds; matches the column defaults.
pub(crate) const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

/// Tables and columns a store reads and writes.
pub(crate) type TableSpec = (&'static str, &'static [&'static str]);

pub(crate) const CATEGORY_TABLE: TableSpec = (
    "biomarker_categories",
    &[
        "uuid",
        "name",
        "description",
        "unit",
        "reference_range_min",
        "reference_range_max",
        "default_target_value",
        "default_acceptable_range",
        "created_at",
        "updated_at",
    ],
);

pub(crate) const RECORD_TABLE: TableSpec = (
    "biomarker_records",
    &[
        "uuid",
        "user_ref",
        "category_uuid",
        "value",
        "date_recorded",
        "notes",
        "created_at",
        "updated_at",
    ],
);

pub(crate) const TARGET_TABLE: TableSpec = (
    "user_biomarker_targets",
    &[
        "uuid",
        "user_ref",
        "category_uuid",
        "target_value",
        "acceptable_range",
        "created_at",
        "updated_at",
    ],
);

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection, tables: &[TableSpec]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(RepoError::ForeignKeysDisabled);
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
