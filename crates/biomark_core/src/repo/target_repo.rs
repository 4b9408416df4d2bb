//! TargetStore: personal biomarker target persistence.
//!
//! # Invariants
//! - One target per `(user_ref, category_uuid)`, enforced by a UNIQUE
//!   constraint so concurrent creates cannot both succeed.
//! - Lookup of a missing target is `Ok(None)`; default resolution belongs to
//!   the evaluator.

use super::common::{ensure_connection_ready, parse_uuid, CATEGORY_TABLE, NOW_MS_SQL, TARGET_TABLE};
use super::error::{constraint_kind, Conflict, ConstraintKind, EntityKind, RepoError, RepoResult};
use crate::model::category::CategoryId;
use crate::model::target::{TargetId, UserBiomarkerTarget};
use crate::model::user::UserRef;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TARGET_SELECT_SQL: &str = "SELECT
    uuid,
    user_ref,
    category_uuid,
    target_value,
    acceptable_range,
    created_at,
    updated_at
FROM user_biomarker_targets";

/// Filter options for listing targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetListQuery {
    pub user: Option<UserRef>,
    pub category_id: Option<CategoryId>,
}

pub trait TargetRepository {
    /// Inserts a new target; fails with `Conflict::UserTarget` on duplicates.
    fn create_target(&self, target: &UserBiomarkerTarget) -> RepoResult<TargetId>;
    /// Replaces value and deviation of an existing target.
    fn update_target(&self, target: &UserBiomarkerTarget) -> RepoResult<()>;
    fn get_target(&self, id: TargetId) -> RepoResult<Option<UserBiomarkerTarget>>;
    fn find_target(
        &self,
        user: &UserRef,
        category_id: CategoryId,
    ) -> RepoResult<Option<UserBiomarkerTarget>>;
    fn list_targets(&self, query: &TargetListQuery) -> RepoResult<Vec<UserBiomarkerTarget>>;
    fn delete_target(&self, id: TargetId) -> RepoResult<()>;
}

/// SQLite-backed target repository.
pub struct SqliteTargetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTargetRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[CATEGORY_TABLE, TARGET_TABLE])?;
        Ok(Self { conn })
    }
}

impl TargetRepository for SqliteTargetRepository<'_> {
    fn create_target(&self, target: &UserBiomarkerTarget) -> RepoResult<TargetId> {
        target.validate()?;

        self.conn
            .execute(
                "INSERT INTO user_biomarker_targets (
                    uuid,
                    user_ref,
                    category_uuid,
                    target_value,
                    acceptable_range
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    target.id.to_string(),
                    target.user.as_str(),
                    target.category_id.to_string(),
                    target.target_value,
                    target.acceptable_range,
                ],
            )
            .map_err(|err| map_write_error(err, target))?;

        Ok(target.id)
    }

    fn update_target(&self, target: &UserBiomarkerTarget) -> RepoResult<()> {
        target.validate()?;

        // Owner and category are part of the identity and stay fixed.
        let changed = self.conn.execute(
            &format!(
                "UPDATE user_biomarker_targets
                 SET
                    target_value = ?1,
                    acceptable_range = ?2,
                    updated_at = {NOW_MS_SQL}
                 WHERE uuid = ?3
                   AND user_ref = ?4
                   AND category_uuid = ?5;"
            ),
            params![
                target.target_value,
                target.acceptable_range,
                target.id.to_string(),
                target.user.as_str(),
                target.category_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Target, target.id));
        }

        Ok(())
    }

    fn get_target(&self, id: TargetId) -> RepoResult<Option<UserBiomarkerTarget>> {
        self.conn
            .query_row(
                &format!("{TARGET_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_target_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_target(
        &self,
        user: &UserRef,
        category_id: CategoryId,
    ) -> RepoResult<Option<UserBiomarkerTarget>> {
        self.conn
            .query_row(
                &format!("{TARGET_SELECT_SQL} WHERE user_ref = ?1 AND category_uuid = ?2;"),
                params![user.as_str(), category_id.to_string()],
                |row| Ok(parse_target_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_targets(&self, query: &TargetListQuery) -> RepoResult<Vec<UserBiomarkerTarget>> {
        let mut sql = format!("{TARGET_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user) = query.user.as_ref() {
            sql.push_str(" AND user_ref = ?");
            bind_values.push(Value::Text(user.as_str().to_string()));
        }
        if let Some(category_id) = query.category_id {
            sql.push_str(" AND category_uuid = ?");
            bind_values.push(Value::Text(category_id.to_string()));
        }
        sql.push_str(" ORDER BY user_ref ASC, category_uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut targets = Vec::new();
        while let Some(row) = rows.next()? {
            targets.push(parse_target_row(row)?);
        }
        Ok(targets)
    }

    fn delete_target(&self, id: TargetId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM user_biomarker_targets WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Target, id));
        }
        Ok(())
    }
}

fn map_write_error(err: rusqlite::Error, target: &UserBiomarkerTarget) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::Unique) => RepoError::Conflict(Conflict::UserTarget {
            user: target.user.clone(),
            category_id: target.category_id,
        }),
        Some(ConstraintKind::PrimaryKey) => RepoError::Conflict(Conflict::DuplicateId(target.id)),
        Some(ConstraintKind::ForeignKey) => {
            RepoError::NotFound(EntityKind::Category, target.category_id)
        }
        None => err.into(),
    }
}

fn parse_target_row(row: &Row<'_>) -> RepoResult<UserBiomarkerTarget> {
    let uuid_text: String = row.get("uuid")?;
    let category_text: String = row.get("category_uuid")?;
    let user_text: String = row.get("user_ref")?;
    let user = UserRef::new(user_text).map_err(|err| {
        RepoError::InvalidData(format!("target {uuid_text} has invalid user_ref: {err}"))
    })?;

    let target = UserBiomarkerTarget {
        id: parse_uuid(&uuid_text, "user_biomarker_targets.uuid")?,
        user,
        category_id: parse_uuid(&category_text, "user_biomarker_targets.category_uuid")?,
        target_value: row.get("target_value")?,
        acceptable_range: row.get("acceptable_range")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    };
    target.validate().map_err(|err| {
        RepoError::InvalidData(format!("target {uuid_text} violates invariants: {err}"))
    })?;
    Ok(target)
}
