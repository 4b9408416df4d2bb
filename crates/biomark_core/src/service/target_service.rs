//! Personal target use-case service.

use crate::model::category::CategoryId;
use crate::model::target::{TargetId, UserBiomarkerTarget};
use crate::model::user::UserRef;
use crate::repo::error::{Conflict, EntityKind, RepoError, RepoResult};
use crate::repo::target_repo::{TargetListQuery, TargetRepository};
use log::info;

pub struct TargetService<T: TargetRepository> {
    repo: T,
}

impl<T: TargetRepository> TargetService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    /// Inserts a new personal target.
    ///
    /// # Errors
    /// - `RepoError::Conflict(Conflict::UserTarget { .. })` when the user
    ///   already has a target for the category.
    /// - `RepoError::NotFound(EntityKind::Category, _)` for unknown categories.
    pub fn create_target(&self, target: &UserBiomarkerTarget) -> RepoResult<UserBiomarkerTarget> {
        let id = self.repo.create_target(target)?;
        info!("event=target_create module=service status=ok target_id={id}");
        self.get_target(id)
    }

    /// Creates the user's target for a category, or overwrites the existing one.
    ///
    /// Inserts first and falls back to an update only on a uniqueness
    /// conflict, so the pair constraint stays the single source of truth.
    pub fn set_personal_target(
        &self,
        user: &UserRef,
        category_id: CategoryId,
        target_value: f64,
        acceptable_range: f64,
    ) -> RepoResult<UserBiomarkerTarget> {
        let candidate =
            UserBiomarkerTarget::new(user.clone(), category_id, target_value, acceptable_range);
        match self.repo.create_target(&candidate) {
            Ok(id) => {
                info!("event=target_set module=service status=ok mode=insert target_id={id}");
                self.get_target(id)
            }
            Err(RepoError::Conflict(Conflict::UserTarget { .. })) => {
                let mut existing = self
                    .repo
                    .find_target(user, category_id)?
                    .ok_or(RepoError::NotFound(EntityKind::Target, candidate.id))?;
                existing.target_value = target_value;
                existing.acceptable_range = acceptable_range;
                self.repo.update_target(&existing)?;
                info!(
                    "event=target_set module=service status=ok mode=update target_id={}",
                    existing.id
                );
                self.get_target(existing.id)
            }
            Err(err) => Err(err),
        }
    }

    pub fn update_target(&self, target: &UserBiomarkerTarget) -> RepoResult<UserBiomarkerTarget> {
        self.repo.update_target(target)?;
        self.get_target(target.id)
    }

    pub fn get_target(&self, id: TargetId) -> RepoResult<UserBiomarkerTarget> {
        self.repo
            .get_target(id)?
            .ok_or(RepoError::NotFound(EntityKind::Target, id))
    }

    /// Personal target for `(user, category)`, if one is configured.
    pub fn lookup_target(
        &self,
        user: &UserRef,
        category_id: CategoryId,
    ) -> RepoResult<Option<UserBiomarkerTarget>> {
        self.repo.find_target(user, category_id)
    }

    pub fn list_targets(&self, query: &TargetListQuery) -> RepoResult<Vec<UserBiomarkerTarget>> {
        self.repo.list_targets(query)
    }

    pub fn delete_target(&self, id: TargetId) -> RepoResult<()> {
        self.repo.delete_target(id)?;
        info!("event=target_delete module=service status=ok target_id={id}");
        Ok(())
    }
}
