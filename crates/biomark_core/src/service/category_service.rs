//! Category use-case service.

use crate::model::category::{BiomarkerCategory, CategoryId};
use crate::repo::category_repo::{CategoryDependents, CategoryListQuery, CategoryRepository};
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use log::{info, warn};

/// Administrative operations on biomarker categories.
pub struct CategoryService<C: CategoryRepository> {
    repo: C,
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Validates, persists and reads back a category.
    ///
    /// # Errors
    /// - `RepoError::Validation` when an invariant fails; nothing is written.
    /// - `RepoError::Conflict` when the name is already taken.
    pub fn create_category(&self, category: &BiomarkerCategory) -> RepoResult<BiomarkerCategory> {
        let id = self.repo.create_category(category).inspect_err(|err| {
            warn!("event=category_create module=service status=error error={err}");
        })?;
        info!("event=category_create module=service status=ok category_id={id}");
        self.get_category(id)
    }

    /// Replaces all editable fields of an existing category.
    pub fn update_category(&self, category: &BiomarkerCategory) -> RepoResult<BiomarkerCategory> {
        self.repo.update_category(category).inspect_err(|err| {
            warn!(
                "event=category_update module=service status=error category_id={} error={err}",
                category.id
            );
        })?;
        info!(
            "event=category_update module=service status=ok category_id={}",
            category.id
        );
        self.get_category(category.id)
    }

    /// Loads a category, failing with `NotFound` when it does not exist.
    pub fn get_category(&self, id: CategoryId) -> RepoResult<BiomarkerCategory> {
        self.repo
            .get_category(id)?
            .ok_or(RepoError::NotFound(EntityKind::Category, id))
    }

    pub fn find_category_by_name(&self, name: &str) -> RepoResult<Option<BiomarkerCategory>> {
        self.repo.find_category_by_name(name)
    }

    pub fn list_categories(&self, query: &CategoryListQuery) -> RepoResult<Vec<BiomarkerCategory>> {
        self.repo.list_categories(query)
    }

    /// Name/description substring search, all results ordered by name.
    pub fn search_categories(&self, text: &str) -> RepoResult<Vec<BiomarkerCategory>> {
        self.repo.list_categories(&CategoryListQuery {
            text: Some(text.to_string()),
            ..CategoryListQuery::default()
        })
    }

    /// Reports what [`Self::delete_category`] would remove.
    ///
    /// Deletion is irreversible; callers show this to the user for
    /// confirmation first.
    pub fn preview_deletion(&self, id: CategoryId) -> RepoResult<CategoryDependents> {
        self.get_category(id)?;
        self.repo.count_dependents(id)
    }

    /// Deletes a category together with all of its records and targets.
    pub fn delete_category(&self, id: CategoryId) -> RepoResult<CategoryDependents> {
        let removed = self.repo.delete_category(id)?;
        info!(
            "event=category_delete module=service status=ok category_id={id} records={} targets={}",
            removed.records, removed.targets
        );
        Ok(removed)
    }
}
