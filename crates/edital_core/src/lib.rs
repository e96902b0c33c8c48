//! Core domain logic for research-program notices and project scoring.
//! This crate is the single source of truth for activity scoring invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scoring;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::catalog::{
    ActivityCatalog, ActivityCategory, ActivityDefinition, ActivityId, CatalogError, CategoryId,
};
pub use model::notice::{Lifecycle, Notice, NoticeId, NoticeValidationError};
pub use model::project::{Project, ProjectActivityRecord, ProjectId};
pub use repo::notice_repo::{NoticeListQuery, NoticeRepository, SqliteNoticeRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::{RepoError, RepoResult};
pub use scoring::calculator::{compute_score, ActivityProgress, ScoreReport};
pub use scoring::ledger::{informed_count, set_informed_count};
pub use service::notice_service::{NoticeDraft, NoticeService};
pub use service::project_service::{ProjectScore, ProjectService, ReportOutcome};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
