//! CategoryStore: biomarker category persistence.
//!
//! # Invariants
//! - Create and update always run `BiomarkerCategory::validate()`.
//! - Category names are unique case-insensitively (unique index) and are
//!   whitespace-normalized on every write.
//! - Deleting a category cascades to its records and targets.

use super::common::{ensure_connection_ready, parse_uuid, CATEGORY_TABLE, NOW_MS_SQL};
use super::error::{constraint_kind, Conflict, ConstraintKind, EntityKind, RepoError, RepoResult};
use crate::model::category::{BiomarkerCategory, CategoryId};
use crate::model::validation::normalize_label;
use crate::search::text::build_text_filter;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description,
    unit,
    reference_range_min,
    reference_range_max,
    default_target_value,
    default_acceptable_range,
    created_at,
    updated_at
FROM biomarker_categories";

/// List/search options. Results are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryListQuery {
    /// Substring search over name and description.
    pub text: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Rows removed (or that would be removed) together with a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryDependents {
    pub records: u64,
    pub targets: u64,
}

/// Repository interface for category CRUD and search.
pub trait CategoryRepository {
    fn create_category(&self, category: &BiomarkerCategory) -> RepoResult<CategoryId>;
    fn update_category(&self, category: &BiomarkerCategory) -> RepoResult<()>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<BiomarkerCategory>>;
    fn find_category_by_name(&self, name: &str) -> RepoResult<Option<BiomarkerCategory>>;
    fn list_categories(&self, query: &CategoryListQuery) -> RepoResult<Vec<BiomarkerCategory>>;
    /// Counts records and targets that reference the category.
    fn count_dependents(&self, id: CategoryId) -> RepoResult<CategoryDependents>;
    /// Deletes the category and everything referencing it.
    fn delete_category(&self, id: CategoryId) -> RepoResult<CategoryDependents>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[CATEGORY_TABLE])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &BiomarkerCategory) -> RepoResult<CategoryId> {
        let category = &category.normalized();
        category.validate()?;

        self.conn
            .execute(
                "INSERT INTO biomarker_categories (
                    uuid,
                    name,
                    description,
                    unit,
                    reference_range_min,
                    reference_range_max,
                    default_target_value,
                    default_acceptable_range
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    category.id.to_string(),
                    category.name.as_str(),
                    category.description.as_str(),
                    category.unit.as_str(),
                    category.reference_range_min,
                    category.reference_range_max,
                    category.default_target_value,
                    category.default_acceptable_range,
                ],
            )
            .map_err(|err| map_write_error(err, category))?;

        Ok(category.id)
    }

    fn update_category(&self, category: &BiomarkerCategory) -> RepoResult<()> {
        let category = &category.normalized();
        category.validate()?;

        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE biomarker_categories
                     SET
                        name = ?1,
                        description = ?2,
                        unit = ?3,
                        reference_range_min = ?4,
                        reference_range_max = ?5,
                        default_target_value = ?6,
                        default_acceptable_range = ?7,
                        updated_at = {NOW_MS_SQL}
                     WHERE uuid = ?8;"
                ),
                params![
                    category.name.as_str(),
                    category.description.as_str(),
                    category.unit.as_str(),
                    category.reference_range_min,
                    category.reference_range_max,
                    category.default_target_value,
                    category.default_acceptable_range,
                    category.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, category))?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Category, category.id));
        }

        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<BiomarkerCategory>> {
        self.conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_category_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_category_by_name(&self, name: &str) -> RepoResult<Option<BiomarkerCategory>> {
        self.conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE;"),
                [normalize_label(name)],
                |row| Ok(parse_category_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_categories(&self, query: &CategoryListQuery) -> RepoResult<Vec<BiomarkerCategory>> {
        let mut sql = format!("{CATEGORY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(filter) = query
            .text
            .as_deref()
            .and_then(|text| build_text_filter(text, &["name", "description"]))
        {
            sql.push_str(" AND ");
            sql.push_str(&filter.clause);
            bind_values.extend(filter.bind_values);
        }

        sql.push_str(" ORDER BY name COLLATE NOCASE ASC, uuid ASC");

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
            None if query.offset > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
            None => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }

        Ok(categories)
    }

    fn count_dependents(&self, id: CategoryId) -> RepoResult<CategoryDependents> {
        count_dependents_on(self.conn, &id.to_string())
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<CategoryDependents> {
        let id_text = id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        let dependents = count_dependents_on(&tx, &id_text)?;

        let changed = tx.execute(
            "DELETE FROM biomarker_categories WHERE uuid = ?1;",
            [id_text.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Category, id));
        }

        tx.commit()?;
        Ok(dependents)
    }
}

fn count_dependents_on(conn: &Connection, category_uuid: &str) -> RepoResult<CategoryDependents> {
    let (records, targets): (i64, i64) = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM biomarker_records WHERE category_uuid = ?1),
            (SELECT COUNT(*) FROM user_biomarker_targets WHERE category_uuid = ?1);",
        [category_uuid],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(CategoryDependents {
        records: u64::try_from(records).unwrap_or_default(),
        targets: u64::try_from(targets).unwrap_or_default(),
    })
}

fn map_write_error(err: rusqlite::Error, category: &BiomarkerCategory) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::Unique) => {
            RepoError::Conflict(Conflict::CategoryName(category.name.clone()))
        }
        Some(ConstraintKind::PrimaryKey) => RepoError::Conflict(Conflict::DuplicateId(category.id)),
        _ => err.into(),
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<BiomarkerCategory> {
    let uuid_text: String = row.get("uuid")?;
    let category = BiomarkerCategory {
        id: parse_uuid(&uuid_text, "biomarker_categories.uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        unit: row.get("unit")?,
        reference_range_min: row.get("reference_range_min")?,
        reference_range_max: row.get("reference_range_max")?,
        default_target_value: row.get("default_target_value")?,
        default_acceptable_range: row.get("default_acceptable_range")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    };
    category.validate().map_err(|err| {
        RepoError::InvalidData(format!("category {uuid_text} violates invariants: {err}"))
    })?;
    Ok(category)
}
