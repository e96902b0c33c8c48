//! Notice ("edital") domain model.
//!
//! # Responsibility
//! - Define the admission-cycle document that owns an activity catalog.
//! - Model soft deletion as an explicit lifecycle state.
//!
//! # Invariants
//! - `id` is stable and never reused for another notice.
//! - `title` is never blank.
//! - `closes_at` is not earlier than `opens_at` when both are set.

use crate::model::catalog::{ActivityCatalog, CatalogError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of a notice.
pub type NoticeId = Uuid;

/// Lifecycle state shared by soft-deletable records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    /// Logically removed; `at` is epoch milliseconds.
    Deleted { at: i64 },
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Deletion timestamp, if deleted.
    pub fn deleted_at(&self) -> Option<i64> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }
}

/// Notice-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoticeValidationError {
    #[error("notice id must not be nil")]
    NilId,
    #[error("notice title must not be blank")]
    BlankTitle,
    #[error("closes_at ({closes_at}) must be >= opens_at ({opens_at})")]
    InvalidWindow { opens_at: i64, closes_at: i64 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Admission/call cycle document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub title: String,
    /// Submission window start, epoch milliseconds.
    pub opens_at: Option<i64>,
    /// Submission window end, epoch milliseconds.
    pub closes_at: Option<i64>,
    /// Creation time in epoch milliseconds; orders "most recent prior notice".
    pub created_at: i64,
    pub lifecycle: Lifecycle,
    pub catalog: ActivityCatalog,
}

impl Notice {
    /// Creates an active notice with a generated id and an empty catalog.
    pub fn new(title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            opens_at: None,
            closes_at: None,
            created_at,
            lifecycle: Lifecycle::Active,
            catalog: ActivityCatalog::new(),
        }
    }

    /// Checks notice invariants, including the owned catalog.
    pub fn validate(&self) -> Result<(), NoticeValidationError> {
        if self.id.is_nil() {
            return Err(NoticeValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(NoticeValidationError::BlankTitle);
        }
        if let (Some(opens_at), Some(closes_at)) = (self.opens_at, self.closes_at) {
            if closes_at < opens_at {
                return Err(NoticeValidationError::InvalidWindow {
                    opens_at,
                    closes_at,
                });
            }
        }
        self.catalog.validate()?;
        Ok(())
    }

    /// Marks this notice as logically deleted at `at` (epoch ms).
    pub fn soft_delete(&mut self, at: i64) {
        self.lifecycle = Lifecycle::Deleted { at };
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }
}
