//! Project domain model and its activity ledger records.
//!
//! # Invariants
//! - A project references exactly one notice; the reference never changes.
//! - Ledger records are not unique by construction; readers tolerate
//!   duplicates and missing entries.

use crate::model::catalog::ActivityId;
use crate::model::notice::{Lifecycle, NoticeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a project.
pub type ProjectId = Uuid;

/// Self-reported occurrence count for one catalog activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectActivityRecord {
    pub activity_id: ActivityId,
    pub informed_activities: u32,
}

impl ProjectActivityRecord {
    pub fn new(activity_id: ActivityId, informed_activities: u32) -> Self {
        Self {
            activity_id,
            informed_activities,
        }
    }
}

/// A student's submission against one notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    notice_id: NoticeId,
    pub title: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    pub lifecycle: Lifecycle,
    /// Ordered activity ledger.
    pub records: Vec<ProjectActivityRecord>,
}

impl Project {
    /// Creates a project bound to `notice_id` with an empty ledger.
    pub fn new(notice_id: NoticeId, title: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), notice_id, title, created_at)
    }

    /// Creates a project with a caller-provided id (storage/import paths).
    pub fn with_id(
        id: ProjectId,
        notice_id: NoticeId,
        title: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            notice_id,
            title: title.into(),
            created_at,
            lifecycle: Lifecycle::Active,
            records: Vec::new(),
        }
    }

    /// The notice whose catalog defines this project's scoreable activities.
    pub fn notice_id(&self) -> NoticeId {
        self.notice_id
    }
}
