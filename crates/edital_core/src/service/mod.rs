//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI/UI layers decoupled from storage details.
//!
//! # Invariants
//! - Services never bypass repository validation.
//! - A failed fetch leaves previously returned state untouched; nothing is
//!   written before every required read succeeded.

use crate::model::catalog::CatalogError;
use crate::model::notice::{NoticeId, NoticeValidationError};
use crate::model::project::ProjectId;
use crate::repo::{RepoError, RepoResult};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub mod notice_service;
pub mod project_service;

/// Service error for notice and project use-cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("notice not found: {0}")]
    NoticeNotFound(NoticeId),
    #[error("notice is deleted: {0}")]
    NoticeDeleted(NoticeId),
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("project title must not be blank")]
    BlankProjectTitle,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Validation(#[from] NoticeValidationError),
    /// Persistence-layer failure.
    #[error(transparent)]
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    #[error("inconsistent state: {0}")]
    InconsistentState(&'static str),
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "notice",
                id,
            } => Self::NoticeNotFound(id),
            RepoError::NotFound {
                entity: "project",
                id,
            } => Self::ProjectNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

pub(crate) fn require_found<T>(value: RepoResult<Option<T>>, missing: ServiceError) -> ServiceResult<T> {
    value?.ok_or(missing)
}
