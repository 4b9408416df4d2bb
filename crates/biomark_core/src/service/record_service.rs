//! Record use-case service and read-time status views.
//!
//! # Invariants
//! - Evaluation loads the category and the personal target explicitly, then
//!   computes; no lazy lookups happen behind a record.
//! - Views are computed per read and never written back.

use crate::eval::{evaluate, Evaluation};
use crate::model::category::{BiomarkerCategory, CategoryId};
use crate::model::record::{BiomarkerRecord, RecordId};
use crate::model::target::UserBiomarkerTarget;
use crate::model::user::UserRef;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use crate::repo::record_repo::{RecordListQuery, RecordRepository};
use crate::repo::target_repo::TargetRepository;
use log::info;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// A record together with its category and derived status.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordView {
    pub record: BiomarkerRecord,
    pub category: BiomarkerCategory,
    pub evaluation: Evaluation,
}

impl Display for RecordView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.record.display_with(&self.category),
            self.evaluation.status
        )
    }
}

pub struct RecordService<R, C, T>
where
    R: RecordRepository,
    C: CategoryRepository,
    T: TargetRepository,
{
    records: R,
    categories: C,
    targets: T,
}

impl<R, C, T> RecordService<R, C, T>
where
    R: RecordRepository,
    C: CategoryRepository,
    T: TargetRepository,
{
    pub fn new(records: R, categories: C, targets: T) -> Self {
        Self {
            records,
            categories,
            targets,
        }
    }

    /// Persists a measurement and reads it back.
    ///
    /// Values outside the reference range are accepted.
    pub fn create_record(&self, record: &BiomarkerRecord) -> RepoResult<BiomarkerRecord> {
        let id = self.records.create_record(record)?;
        info!(
            "event=record_create module=service status=ok record_id={id} category_id={}",
            record.category_id
        );
        self.get_record(id)
    }

    pub fn update_record(&self, record: &BiomarkerRecord) -> RepoResult<BiomarkerRecord> {
        self.records.update_record(record)?;
        info!(
            "event=record_update module=service status=ok record_id={}",
            record.id
        );
        self.get_record(record.id)
    }

    pub fn get_record(&self, id: RecordId) -> RepoResult<BiomarkerRecord> {
        self.records
            .get_record(id)?
            .ok_or(RepoError::NotFound(EntityKind::Record, id))
    }

    pub fn list_records(&self, query: &RecordListQuery) -> RepoResult<Vec<BiomarkerRecord>> {
        self.records.list_records(query)
    }

    /// Free-text search over notes, user and category name.
    pub fn search_records(&self, text: &str, limit: Option<u32>) -> RepoResult<Vec<BiomarkerRecord>> {
        self.records.list_records(&RecordListQuery {
            text: Some(text.to_string()),
            limit,
            ..RecordListQuery::default()
        })
    }

    pub fn delete_record(&self, id: RecordId) -> RepoResult<()> {
        self.records.delete_record(id)?;
        info!("event=record_delete module=service status=ok record_id={id}");
        Ok(())
    }

    /// Loads one record with its category and evaluates it.
    pub fn view_record(&self, id: RecordId) -> RepoResult<RecordView> {
        let record = self.get_record(id)?;
        let category = self.load_category(record.category_id)?;
        let personal = self.targets.find_target(&record.user, record.category_id)?;
        let evaluation = evaluate(&category, personal.as_ref(), record.value);
        Ok(RecordView {
            record,
            category,
            evaluation,
        })
    }

    /// Lists records and evaluates each one.
    ///
    /// Categories and targets are loaded once per distinct key. Paging follows
    /// [`RecordListQuery`]: `limit: None` returns at most 100 views, so callers
    /// wanting everything advance `offset` until a short page comes back.
    pub fn list_record_views(&self, query: &RecordListQuery) -> RepoResult<Vec<RecordView>> {
        let records = self.records.list_records(query)?;
        let mut categories: HashMap<CategoryId, BiomarkerCategory> = HashMap::new();
        let mut targets: HashMap<(UserRef, CategoryId), Option<UserBiomarkerTarget>> =
            HashMap::new();
        let mut views = Vec::with_capacity(records.len());

        for record in records {
            if !categories.contains_key(&record.category_id) {
                let category = self.load_category(record.category_id)?;
                categories.insert(record.category_id, category);
            }
            let key = (record.user.clone(), record.category_id);
            if !targets.contains_key(&key) {
                let personal = self.targets.find_target(&record.user, record.category_id)?;
                targets.insert(key.clone(), personal);
            }

            let category = categories[&record.category_id].clone();
            let personal = targets.get(&key).and_then(Option::as_ref);
            let evaluation = evaluate(&category, personal, record.value);
            views.push(RecordView {
                record,
                category,
                evaluation,
            });
        }

        Ok(views)
    }

    fn load_category(&self, id: CategoryId) -> RepoResult<BiomarkerCategory> {
        self.categories
            .get_category(id)?
            .ok_or(RepoError::NotFound(EntityKind::Category, id))
    }
}
