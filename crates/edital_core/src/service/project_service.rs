//! Project use-case service: ledger reporting and scoring.
//!
//! # Responsibility
//! - Create projects bound to an active notice.
//! - Apply ledger edits, persist the full ledger and return a fresh score.
//! - Serve the read-only score review of a project.
//!
//! # Invariants
//! - Review and report paths share `compute_score`; totals cannot diverge.
//! - Catalog and ledger are fetched before anything is written.
//! - Rejected ledger input is not persisted.

use crate::model::catalog::{ActivityCatalog, ActivityId};
use crate::model::notice::NoticeId;
use crate::model::project::{Project, ProjectActivityRecord, ProjectId};
use crate::repo::notice_repo::NoticeRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::scoring::calculator::{compute_score, max_total, ScoreReport};
use crate::scoring::ledger::set_informed_count;
use crate::service::{now_epoch_ms, require_found, ServiceError, ServiceResult};
use log::{debug, info};

/// Score view of one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectScore {
    pub project_id: ProjectId,
    pub notice_id: NoticeId,
    /// Ledger the report was computed from.
    pub records: Vec<ProjectActivityRecord>,
    pub report: ScoreReport,
    /// Highest reachable total under the notice catalog.
    pub max_total: u64,
}

/// Outcome of one ledger edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    /// `false` when the input was rejected or did not change the ledger.
    pub changed: bool,
    pub score: ProjectScore,
}

/// Project service facade over notice and project repositories.
pub struct ProjectService<N: NoticeRepository, P: ProjectRepository> {
    notices: N,
    projects: P,
}

impl<N: NoticeRepository, P: ProjectRepository> ProjectService<N, P> {
    pub fn new(notices: N, projects: P) -> Self {
        Self { notices, projects }
    }

    /// Creates a project with an empty ledger against an active notice.
    pub fn create_project(
        &self,
        notice_id: NoticeId,
        title: impl Into<String>,
    ) -> ServiceResult<Project> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ServiceError::BlankProjectTitle);
        }

        let notice = require_found(
            self.notices.get_notice(notice_id, true),
            ServiceError::NoticeNotFound(notice_id),
        )?;
        if !notice.is_active() {
            return Err(ServiceError::NoticeDeleted(notice_id));
        }

        let project = Project::new(notice_id, title, now_epoch_ms());
        self.projects.create_project(&project)?;
        info!(
            "event=project_create module=service status=ok project_id={} notice_id={}",
            project.id, notice_id
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> ServiceResult<Project> {
        require_found(
            self.projects.get_project(id, false),
            ServiceError::ProjectNotFound(id),
        )
    }

    /// Read-only score review of one project.
    pub fn score_project(&self, id: ProjectId) -> ServiceResult<ProjectScore> {
        let project = self.get_project(id)?;
        let catalog = self.notices.fetch_catalog(project.notice_id())?;
        Ok(build_score(&project, project.records.clone(), &catalog))
    }

    /// Applies a raw count typed by the user and returns the new score.
    ///
    /// Invalid input is ignored: nothing is written and the returned score
    /// reflects the stored ledger.
    pub fn report_activity(
        &self,
        project_id: ProjectId,
        activity_id: ActivityId,
        raw_value: &str,
    ) -> ServiceResult<ReportOutcome> {
        let project = self.get_project(project_id)?;
        let catalog = self.notices.fetch_catalog(project.notice_id())?;

        let next = set_informed_count(&project.records, activity_id, raw_value);
        let changed = next != project.records;
        if changed {
            self.projects.save_records(project_id, &next)?;
            debug!(
                "event=ledger_save module=service status=ok project_id={} records={}",
                project_id,
                next.len()
            );
        }

        let score = build_score(&project, next, &catalog);
        info!(
            "event=activity_report module=service status=ok project_id={} activity_id={} changed={} total={}",
            project_id, activity_id, changed, score.report.total
        );
        Ok(ReportOutcome { changed, score })
    }

    /// Scores every active project of a notice, highest total first.
    ///
    /// Ties keep project creation order.
    pub fn rank_projects(&self, notice_id: NoticeId) -> ServiceResult<Vec<ProjectScore>> {
        let catalog = self.notices.fetch_catalog(notice_id)?;
        let projects = self.projects.list_projects_for_notice(notice_id)?;

        let mut scores: Vec<ProjectScore> = projects
            .iter()
            .map(|project| build_score(project, project.records.clone(), &catalog))
            .collect();
        scores.sort_by(|left, right| right.report.total.cmp(&left.report.total));
        Ok(scores)
    }

    /// Logically deletes a project.
    pub fn soft_delete_project(&self, id: ProjectId) -> ServiceResult<()> {
        self.projects.soft_delete_project(id, now_epoch_ms())?;
        info!("event=project_delete module=service status=ok project_id={id}");
        Ok(())
    }
}

fn build_score(
    project: &Project,
    records: Vec<ProjectActivityRecord>,
    catalog: &ActivityCatalog,
) -> ProjectScore {
    let report = compute_score(catalog, &records);
    ProjectScore {
        project_id: project.id,
        notice_id: project.notice_id(),
        records,
        report,
        max_total: max_total(catalog),
    }
}
