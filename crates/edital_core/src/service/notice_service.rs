//! Notice use-case service.
//!
//! # Responsibility
//! - Create notices, carrying the catalog of the latest prior notice
//!   forward when no catalog is supplied.
//! - Apply in-memory catalog edits and persist the result atomically.
//!
//! # Invariants
//! - Seeded catalogs are copies; editing them never touches the prior notice.
//! - Deleted notices are read-only.
//! - A rejected edit persists nothing.

use crate::model::catalog::{ActivityCatalog, CatalogError};
use crate::model::notice::{Notice, NoticeId};
use crate::repo::notice_repo::{NoticeListQuery, NoticeRepository};
use crate::service::{now_epoch_ms, require_found, ServiceError, ServiceResult};
use log::{info, warn};

/// Input for creating a notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeDraft {
    pub title: String,
    pub opens_at: Option<i64>,
    pub closes_at: Option<i64>,
    /// Explicit catalog; `None` seeds from the latest prior notice.
    pub catalog: Option<ActivityCatalog>,
}

impl NoticeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Notice service facade over repository implementations.
pub struct NoticeService<R: NoticeRepository> {
    repo: R,
}

impl<R: NoticeRepository> NoticeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and persists one notice.
    pub fn create_notice(&self, draft: NoticeDraft) -> ServiceResult<Notice> {
        let seeded = draft.catalog.is_none();
        let catalog = match draft.catalog {
            Some(catalog) => catalog,
            None => self.seed_catalog(None)?,
        };

        let mut notice = Notice::new(draft.title, now_epoch_ms());
        notice.opens_at = draft.opens_at;
        notice.closes_at = draft.closes_at;
        notice.catalog = catalog;

        let notice_id = self.repo.create_notice(&notice)?;
        info!(
            "event=notice_create module=service status=ok notice_id={} seeded={} categories={} activities={}",
            notice_id,
            seeded,
            notice.catalog.categories().len(),
            notice.catalog.activity_count()
        );

        require_found(
            self.repo.get_notice(notice_id, false),
            ServiceError::InconsistentState("created notice not found in read-back"),
        )
    }

    /// Returns a fresh copy of the latest active notice's catalog, other
    /// than `excluding`, or an empty catalog when there is none.
    pub fn seed_catalog(&self, excluding: Option<NoticeId>) -> ServiceResult<ActivityCatalog> {
        let prior = self.repo.latest_notice(excluding)?;
        Ok(ActivityCatalog::seed_from(
            prior.as_ref().map(|notice| &notice.catalog),
        ))
    }

    /// Gets one notice by id.
    pub fn get_notice(&self, id: NoticeId, include_deleted: bool) -> ServiceResult<Notice> {
        require_found(
            self.repo.get_notice(id, include_deleted),
            ServiceError::NoticeNotFound(id),
        )
    }

    /// Lists notices, most recent first.
    pub fn list_notices(&self, query: &NoticeListQuery) -> ServiceResult<Vec<Notice>> {
        Ok(self.repo.list_notices(query)?)
    }

    /// Fetches the catalog of one notice.
    pub fn get_catalog(&self, id: NoticeId) -> ServiceResult<ActivityCatalog> {
        Ok(self.repo.fetch_catalog(id)?)
    }

    /// Applies `edit` to the notice's catalog and persists the result.
    ///
    /// `edit` runs against a working copy; when it fails the stored catalog
    /// is left as it was and the error is returned.
    pub fn edit_catalog<T>(
        &self,
        id: NoticeId,
        edit: impl FnOnce(&mut ActivityCatalog) -> Result<T, CatalogError>,
    ) -> ServiceResult<(T, Notice)> {
        let mut notice = self.get_notice(id, true)?;
        if !notice.is_active() {
            return Err(ServiceError::NoticeDeleted(id));
        }

        let output = match edit(&mut notice.catalog) {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    "event=catalog_edit module=service status=rejected notice_id={} error={}",
                    id, err
                );
                return Err(err.into());
            }
        };

        self.repo.update_notice(&notice)?;
        info!(
            "event=catalog_edit module=service status=ok notice_id={} categories={} activities={}",
            id,
            notice.catalog.categories().len(),
            notice.catalog.activity_count()
        );
        Ok((output, notice))
    }

    /// Logically deletes a notice.
    pub fn soft_delete_notice(&self, id: NoticeId) -> ServiceResult<()> {
        self.repo.soft_delete_notice(id, now_epoch_ms())?;
        info!("event=notice_delete module=service status=ok notice_id={id}");
        Ok(())
    }
}
