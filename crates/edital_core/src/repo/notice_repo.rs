//! Notice repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notices together with their nested activity catalog.
//! - Serve the catalog source used by scoring (`fetch_catalog`) and the
//!   prior-notice lookup used by catalog seeding (`latest_notice`).
//!
//! # Invariants
//! - A notice header and its catalog rows are written in one transaction.
//! - Catalog order is persisted through `sort_order` and restored on read.
//! - Category and activity ids are scoped to their notice; two notices may
//!   carry the same ids.
//! - "Most recent" means `created_at DESC`, then insertion order.
//! - Soft deletion keeps the first deletion timestamp.

use crate::model::catalog::{ActivityCatalog, ActivityCategory, ActivityDefinition};
use crate::model::notice::{Notice, NoticeId};
use crate::repo::{
    ensure_connection_ready, lifecycle_from_db, parse_u32, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const NOTICE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    opens_at,
    closes_at,
    created_at,
    deleted_at
FROM notices";

const NOTICE_TABLES: &[&str] = &["notices", "activity_categories", "activity_definitions"];

/// Query options for listing notices.
#[derive(Debug, Clone, Default)]
pub struct NoticeListQuery {
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Catalog source and persistence contract for notices.
pub trait NoticeRepository {
    fn create_notice(&self, notice: &Notice) -> RepoResult<NoticeId>;
    /// Replaces header fields and the whole catalog. `created_at` is kept.
    fn update_notice(&self, notice: &Notice) -> RepoResult<()>;
    fn get_notice(&self, id: NoticeId, include_deleted: bool) -> RepoResult<Option<Notice>>;
    /// Lists notices, most recent first.
    fn list_notices(&self, query: &NoticeListQuery) -> RepoResult<Vec<Notice>>;
    /// Most recent active notice other than `excluding`.
    fn latest_notice(&self, excluding: Option<NoticeId>) -> RepoResult<Option<Notice>>;
    /// Full category/activity tree of a notice, deleted notices included.
    fn fetch_catalog(&self, id: NoticeId) -> RepoResult<ActivityCatalog>;
    fn soft_delete_notice(&self, id: NoticeId, at: i64) -> RepoResult<()>;
}

/// SQLite-backed notice repository.
pub struct SqliteNoticeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoticeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, NOTICE_TABLES)?;
        Ok(Self { conn })
    }

    fn load_notices(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Notice>> {
        let mut headers = Vec::new();
        {
            let mut stmt = self.conn.prepare(sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            while let Some(row) = rows.next()? {
                headers.push(parse_notice_row(row)?);
            }
        }

        for notice in &mut headers {
            notice.catalog = load_catalog(self.conn, notice.id)?;
        }
        Ok(headers)
    }

    fn notice_exists(&self, id: NoticeId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM notices WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl NoticeRepository for SqliteNoticeRepository<'_> {
    fn create_notice(&self, notice: &Notice) -> RepoResult<NoticeId> {
        notice.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notices (
                uuid,
                title,
                opens_at,
                closes_at,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                notice.id.to_string(),
                notice.title.as_str(),
                notice.opens_at,
                notice.closes_at,
                notice.created_at,
                notice.lifecycle.deleted_at(),
            ],
        )?;
        write_catalog(&tx, notice.id, &notice.catalog)?;
        tx.commit()?;

        Ok(notice.id)
    }

    fn update_notice(&self, notice: &Notice) -> RepoResult<()> {
        notice.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE notices
             SET
                title = ?2,
                opens_at = ?3,
                closes_at = ?4,
                deleted_at = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                notice.id.to_string(),
                notice.title.as_str(),
                notice.opens_at,
                notice.closes_at,
                notice.lifecycle.deleted_at(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "notice",
                id: notice.id,
            });
        }

        write_catalog(&tx, notice.id, &notice.catalog)?;
        tx.commit()?;
        Ok(())
    }

    fn get_notice(&self, id: NoticeId, include_deleted: bool) -> RepoResult<Option<Notice>> {
        let sql = format!(
            "{NOTICE_SELECT_SQL}
             WHERE uuid = ?
               AND (? = 1 OR deleted_at IS NULL);"
        );
        let mut notices = self.load_notices(
            &sql,
            vec![
                Value::Text(id.to_string()),
                Value::Integer(i64::from(include_deleted)),
            ],
        )?;
        Ok(notices.pop())
    }

    fn list_notices(&self, query: &NoticeListQuery) -> RepoResult<Vec<Notice>> {
        let mut sql = format!("{NOTICE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.load_notices(&sql, bind_values)
    }

    fn latest_notice(&self, excluding: Option<NoticeId>) -> RepoResult<Option<Notice>> {
        let sql = format!(
            "{NOTICE_SELECT_SQL}
             WHERE deleted_at IS NULL
               AND (?1 IS NULL OR uuid <> ?1)
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1;"
        );
        let excluded = match excluding {
            Some(id) => Value::Text(id.to_string()),
            None => Value::Null,
        };
        let mut notices = self.load_notices(&sql, vec![excluded])?;
        Ok(notices.pop())
    }

    fn fetch_catalog(&self, id: NoticeId) -> RepoResult<ActivityCatalog> {
        if !self.notice_exists(id)? {
            return Err(RepoError::NotFound {
                entity: "notice",
                id,
            });
        }
        load_catalog(self.conn, id)
    }

    fn soft_delete_notice(&self, id: NoticeId, at: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notices
             SET
                deleted_at = COALESCE(deleted_at, ?2),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), at],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "notice",
                id,
            });
        }
        Ok(())
    }
}

fn write_catalog(conn: &Connection, notice_id: NoticeId, catalog: &ActivityCatalog) -> RepoResult<()> {
    let notice_uuid = notice_id.to_string();
    conn.execute(
        "DELETE FROM activity_definitions WHERE notice_uuid = ?1;",
        [notice_uuid.as_str()],
    )?;
    conn.execute(
        "DELETE FROM activity_categories WHERE notice_uuid = ?1;",
        [notice_uuid.as_str()],
    )?;

    let mut insert_category = conn.prepare(
        "INSERT INTO activity_categories (uuid, notice_uuid, name, unit, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    let mut insert_activity = conn.prepare(
        "INSERT INTO activity_definitions (
            notice_uuid,
            uuid,
            category_uuid,
            name,
            points,
            point_limit,
            sort_order
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
    )?;

    for (category_order, category) in catalog.categories().iter().enumerate() {
        let category_uuid = category.id.to_string();
        insert_category.execute(params![
            category_uuid.as_str(),
            notice_uuid.as_str(),
            category.name.as_str(),
            category.unit.as_str(),
            category_order as i64,
        ])?;

        for (activity_order, activity) in category.activities.iter().enumerate() {
            insert_activity.execute(params![
                notice_uuid.as_str(),
                activity.id.to_string(),
                category_uuid.as_str(),
                activity.name.as_str(),
                i64::from(activity.points),
                i64::from(activity.limit),
                activity_order as i64,
            ])?;
        }
    }

    Ok(())
}

fn load_catalog(conn: &Connection, notice_id: NoticeId) -> RepoResult<ActivityCatalog> {
    let mut stmt = conn.prepare(
        "SELECT
            c.uuid AS category_uuid,
            c.name AS category_name,
            c.unit AS category_unit,
            d.uuid AS activity_uuid,
            d.name AS activity_name,
            d.points AS points,
            d.point_limit AS point_limit
         FROM activity_categories c
         LEFT JOIN activity_definitions d
            ON d.notice_uuid = c.notice_uuid AND d.category_uuid = c.uuid
         WHERE c.notice_uuid = ?1
         ORDER BY c.sort_order ASC, c.uuid ASC, d.sort_order ASC, d.uuid ASC;",
    )?;
    let mut rows = stmt.query([notice_id.to_string()])?;
    let mut categories: Vec<ActivityCategory> = Vec::new();

    while let Some(row) = rows.next()? {
        let category_text: String = row.get("category_uuid")?;
        let category_id = parse_uuid(&category_text, "activity_categories.uuid")?;

        let is_new_category = categories
            .last()
            .map_or(true, |category| category.id != category_id);
        if is_new_category {
            categories.push(ActivityCategory::with_id(
                category_id,
                row.get::<_, String>("category_name")?,
                row.get::<_, String>("category_unit")?,
            ));
        }

        if let Some(activity) = parse_activity_columns(row)? {
            if let Some(category) = categories.last_mut() {
                category.activities.push(activity);
            }
        }
    }

    ActivityCatalog::from_categories(categories)
        .map_err(|err| RepoError::InvalidData(format!("stored catalog is invalid: {err}")))
}

fn parse_activity_columns(row: &Row<'_>) -> RepoResult<Option<ActivityDefinition>> {
    let Some(activity_text) = row.get::<_, Option<String>>("activity_uuid")? else {
        return Ok(None);
    };

    Ok(Some(ActivityDefinition::with_id(
        parse_uuid(&activity_text, "activity_definitions.uuid")?,
        row.get::<_, String>("activity_name")?,
        parse_u32(row.get("points")?, "activity_definitions.points")?,
        parse_u32(row.get("point_limit")?, "activity_definitions.point_limit")?,
    )))
}

fn parse_notice_row(row: &Row<'_>) -> RepoResult<Notice> {
    let uuid_text: String = row.get("uuid")?;

    Ok(Notice {
        id: parse_uuid(&uuid_text, "notices.uuid")?,
        title: row.get("title")?,
        opens_at: row.get("opens_at")?,
        closes_at: row.get("closes_at")?,
        created_at: row.get("created_at")?,
        lifecycle: lifecycle_from_db(row.get("deleted_at")?),
        catalog: ActivityCatalog::new(),
    })
}
