//! Project repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist projects and their ordered activity ledger.
//! - Serve the ledger source (`fetch_records`) and the persistence sink
//!   (`save_records`) used by scoring use-cases.
//!
//! # Invariants
//! - `save_records` replaces the whole ledger in one transaction.
//! - Ledger order is persisted through `position` and restored on read.
//! - A project's notice reference is written once and never updated.

use crate::model::notice::NoticeId;
use crate::model::project::{Project, ProjectActivityRecord, ProjectId};
use crate::repo::{
    ensure_connection_ready, lifecycle_from_db, parse_u32, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    notice_uuid,
    title,
    created_at,
    deleted_at
FROM projects";

const PROJECT_TABLES: &[&str] = &["projects", "project_activity_records"];

/// Ledger source, persistence sink and project storage contract.
pub trait ProjectRepository {
    /// Inserts the project header and its initial ledger.
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId, include_deleted: bool) -> RepoResult<Option<Project>>;
    /// Active projects of one notice, oldest first.
    fn list_projects_for_notice(&self, notice_id: NoticeId) -> RepoResult<Vec<Project>>;
    fn fetch_records(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectActivityRecord>>;
    /// Replaces the full ledger; no partial update semantics.
    fn save_records(
        &self,
        project_id: ProjectId,
        records: &[ProjectActivityRecord],
    ) -> RepoResult<()>;
    fn soft_delete_project(&self, id: ProjectId, at: i64) -> RepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, PROJECT_TABLES)?;
        Ok(Self { conn })
    }

    fn get_project_header(
        &self,
        id: ProjectId,
        include_deleted: bool,
    ) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), i64::from(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }

        Ok(None)
    }

    fn project_exists(&self, id: ProjectId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO projects (
                uuid,
                notice_uuid,
                title,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                project.id.to_string(),
                project.notice_id().to_string(),
                project.title.as_str(),
                project.created_at,
                project.lifecycle.deleted_at(),
            ],
        )?;
        write_records(&tx, project.id, &project.records)?;
        tx.commit()?;

        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId, include_deleted: bool) -> RepoResult<Option<Project>> {
        let Some(mut project) = self.get_project_header(id, include_deleted)? else {
            return Ok(None);
        };

        project.records = load_records(self.conn, project.id)?;
        Ok(Some(project))
    }

    fn list_projects_for_notice(&self, notice_id: NoticeId) -> RepoResult<Vec<Project>> {
        let mut projects = Vec::new();
        {
            let mut stmt = self.conn.prepare(&format!(
                "{PROJECT_SELECT_SQL}
                 WHERE notice_uuid = ?1
                   AND deleted_at IS NULL
                 ORDER BY created_at ASC, rowid ASC;"
            ))?;
            let mut rows = stmt.query([notice_id.to_string()])?;
            while let Some(row) = rows.next()? {
                projects.push(parse_project_row(row)?);
            }
        }

        for project in &mut projects {
            project.records = load_records(self.conn, project.id)?;
        }
        Ok(projects)
    }

    fn fetch_records(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectActivityRecord>> {
        if !self.project_exists(project_id)? {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project_id,
            });
        }
        load_records(self.conn, project_id)
    }

    fn save_records(
        &self,
        project_id: ProjectId,
        records: &[ProjectActivityRecord],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE projects
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [project_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project_id,
            });
        }

        write_records(&tx, project_id, records)?;
        tx.commit()?;
        Ok(())
    }

    fn soft_delete_project(&self, id: ProjectId, at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                deleted_at = COALESCE(deleted_at, ?2),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), at],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }
}

fn write_records(
    conn: &Connection,
    project_id: ProjectId,
    records: &[ProjectActivityRecord],
) -> RepoResult<()> {
    let project_uuid = project_id.to_string();
    conn.execute(
        "DELETE FROM project_activity_records WHERE project_uuid = ?1;",
        [project_uuid.as_str()],
    )?;

    let mut insert = conn.prepare(
        "INSERT INTO project_activity_records (
            project_uuid,
            position,
            activity_uuid,
            informed_activities
        ) VALUES (?1, ?2, ?3, ?4);",
    )?;
    for (position, record) in records.iter().enumerate() {
        insert.execute(params![
            project_uuid.as_str(),
            position as i64,
            record.activity_id.to_string(),
            i64::from(record.informed_activities),
        ])?;
    }

    Ok(())
}

fn load_records(conn: &Connection, project_id: ProjectId) -> RepoResult<Vec<ProjectActivityRecord>> {
    let mut stmt = conn.prepare(
        "SELECT activity_uuid, informed_activities
         FROM project_activity_records
         WHERE project_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([project_id.to_string()])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let activity_text: String = row.get("activity_uuid")?;
        records.push(ProjectActivityRecord::new(
            parse_uuid(&activity_text, "project_activity_records.activity_uuid")?,
            parse_u32(
                row.get("informed_activities")?,
                "project_activity_records.informed_activities",
            )?,
        ));
    }

    Ok(records)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    let notice_text: String = row.get("notice_uuid")?;

    let mut project = Project::with_id(
        parse_uuid(&uuid_text, "projects.uuid")?,
        parse_uuid(&notice_text, "projects.notice_uuid")?,
        row.get::<_, String>("title")?,
        row.get("created_at")?,
    );
    project.lifecycle = lifecycle_from_db(row.get("deleted_at")?);
    Ok(project)
}
