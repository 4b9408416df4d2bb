//! RecordStore: biomarker measurement persistence.
//!
//! # Invariants
//! - Any finite value is accepted; range status is never computed here.
//! - Lists are ordered by `date_recorded DESC, uuid ASC`.
//! - A record must reference an existing category.

use super::common::{ensure_connection_ready, parse_uuid, CATEGORY_TABLE, NOW_MS_SQL, RECORD_TABLE};
use super::error::{constraint_kind, Conflict, ConstraintKind, EntityKind, RepoError, RepoResult};
use crate::model::category::CategoryId;
use crate::model::record::{BiomarkerRecord, RecordId};
use crate::model::user::UserRef;
use crate::search::text::build_text_filter;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const RECORDS_DEFAULT_LIMIT: u32 = 100;
const RECORDS_LIMIT_MAX: u32 = 1000;

const RECORD_SELECT_SQL: &str = "SELECT
    r.uuid AS uuid,
    r.user_ref AS user_ref,
    r.category_uuid AS category_uuid,
    r.value AS value,
    r.date_recorded AS date_recorded,
    r.notes AS notes,
    r.created_at AS created_at,
    r.updated_at AS updated_at
FROM biomarker_records r
INNER JOIN biomarker_categories c ON c.uuid = r.category_uuid";

/// Searched when `RecordListQuery::text` is set.
const RECORD_SEARCH_COLUMNS: &[&str] = &["r.notes", "r.user_ref", "c.name"];

/// Filter, search and pagination options for records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListQuery {
    pub user: Option<UserRef>,
    pub category_id: Option<CategoryId>,
    /// Inclusive lower bound on `date_recorded` (epoch ms).
    pub recorded_from: Option<i64>,
    /// Inclusive upper bound on `date_recorded` (epoch ms).
    pub recorded_to: Option<i64>,
    /// Substring search over notes, user and category name.
    pub text: Option<String>,
    /// Defaults to 100 and clamps to 1000.
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait RecordRepository {
    fn create_record(&self, record: &BiomarkerRecord) -> RepoResult<RecordId>;
    fn update_record(&self, record: &BiomarkerRecord) -> RepoResult<()>;
    fn get_record(&self, id: RecordId) -> RepoResult<Option<BiomarkerRecord>>;
    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<BiomarkerRecord>>;
    fn delete_record(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[CATEGORY_TABLE, RECORD_TABLE])?;
        Ok(Self { conn })
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn create_record(&self, record: &BiomarkerRecord) -> RepoResult<RecordId> {
        record.validate()?;

        self.conn
            .execute(
                "INSERT INTO biomarker_records (
                    uuid,
                    user_ref,
                    category_uuid,
                    value,
                    date_recorded,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    record.id.to_string(),
                    record.user.as_str(),
                    record.category_id.to_string(),
                    record.value,
                    record.date_recorded,
                    record.notes.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, record))?;

        Ok(record.id)
    }

    fn update_record(&self, record: &BiomarkerRecord) -> RepoResult<()> {
        record.validate()?;

        // Records never change owner.
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE biomarker_records
                     SET
                        category_uuid = ?1,
                        value = ?2,
                        date_recorded = ?3,
                        notes = ?4,
                        updated_at = {NOW_MS_SQL}
                     WHERE uuid = ?5
                       AND user_ref = ?6;"
                ),
                params![
                    record.category_id.to_string(),
                    record.value,
                    record.date_recorded,
                    record.notes.as_str(),
                    record.id.to_string(),
                    record.user.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, record))?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Record, record.id));
        }

        Ok(())
    }

    fn get_record(&self, id: RecordId) -> RepoResult<Option<BiomarkerRecord>> {
        self.conn
            .query_row(
                &format!("{RECORD_SELECT_SQL} WHERE r.uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_record_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<BiomarkerRecord>> {
        let mut sql = format!("{RECORD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user) = query.user.as_ref() {
            sql.push_str(" AND r.user_ref = ?");
            bind_values.push(Value::Text(user.as_str().to_string()));
        }
        if let Some(category_id) = query.category_id {
            sql.push_str(" AND r.category_uuid = ?");
            bind_values.push(Value::Text(category_id.to_string()));
        }
        if let Some(from) = query.recorded_from {
            sql.push_str(" AND r.date_recorded >= ?");
            bind_values.push(Value::Integer(from));
        }
        if let Some(to) = query.recorded_to {
            sql.push_str(" AND r.date_recorded <= ?");
            bind_values.push(Value::Integer(to));
        }
        if let Some(filter) = query
            .text
            .as_deref()
            .and_then(|text| build_text_filter(text, RECORD_SEARCH_COLUMNS))
        {
            sql.push_str(" AND ");
            sql.push_str(&filter.clause);
            bind_values.extend(filter.bind_values);
        }

        sql.push_str(" ORDER BY r.date_recorded DESC, r.uuid ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(normalize_record_limit(query.limit))));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn delete_record(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM biomarker_records WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Record, id));
        }
        Ok(())
    }
}

/// Normalizes list limit: `None`/`0` use the default, large values clamp.
pub fn normalize_record_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => RECORDS_DEFAULT_LIMIT,
        Some(value) => value.min(RECORDS_LIMIT_MAX),
    }
}

fn map_write_error(err: rusqlite::Error, record: &BiomarkerRecord) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::PrimaryKey) => RepoError::Conflict(Conflict::DuplicateId(record.id)),
        Some(ConstraintKind::ForeignKey) => {
            RepoError::NotFound(EntityKind::Category, record.category_id)
        }
        _ => err.into(),
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<BiomarkerRecord> {
    let uuid_text: String = row.get("uuid")?;
    let category_text: String = row.get("category_uuid")?;
    let user_text: String = row.get("user_ref")?;
    let user = UserRef::new(user_text).map_err(|err| {
        RepoError::InvalidData(format!("record {uuid_text} has invalid user_ref: {err}"))
    })?;

    Ok(BiomarkerRecord {
        id: parse_uuid(&uuid_text, "biomarker_records.uuid")?,
        user,
        category_id: parse_uuid(&category_text, "biomarker_records.category_uuid")?,
        value: row.get("value")?,
        date_recorded: row.get("date_recorded")?,
        notes: row.get("notes")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
