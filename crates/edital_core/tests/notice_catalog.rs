use edital_core::db::open_db_in_memory;
use edital_core::{
    ActivityCatalog, ActivityCategory, ActivityDefinition, CatalogError, NoticeDraft,
    NoticeListQuery, NoticeRepository, NoticeService, NoticeValidationError, RepoError,
    ServiceError, SqliteNoticeRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn sample_catalog() -> ActivityCatalog {
    ActivityCatalog::from_categories(vec![
        ActivityCategory::new("Papers", "count")
            .with_activity(ActivityDefinition::new("Journal paper", 10, 30))
            .with_activity(ActivityDefinition::new("Conference paper", 5, 15)),
        ActivityCategory::new("Extension", "hours")
            .with_activity(ActivityDefinition::new("Workshop", 1, 20)),
    ])
    .unwrap()
}

fn shape(catalog: &ActivityCatalog) -> Vec<(String, String, Vec<(String, u32, u32)>)> {
    catalog
        .categories()
        .iter()
        .map(|category| {
            (
                category.name.clone(),
                category.unit.clone(),
                category
                    .activities
                    .iter()
                    .map(|activity| (activity.name.clone(), activity.points, activity.limit))
                    .collect(),
            )
        })
        .collect()
}

#[test]
fn create_and_get_roundtrip_preserves_catalog_order() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let mut draft = NoticeDraft::new("Edital 2026");
    draft.opens_at = Some(1_700_000_000_000);
    draft.closes_at = Some(1_700_100_000_000);
    draft.catalog = Some(sample_catalog());

    let created = service.create_notice(draft).unwrap();
    let loaded = service.get_notice(created.id, false).unwrap();

    assert_eq!(loaded, created);
    assert_eq!(shape(&loaded.catalog), shape(&sample_catalog()));
    assert_eq!(loaded.opens_at, Some(1_700_000_000_000));
    assert_eq!(loaded.catalog.activity_count(), 3);
}

#[test]
fn first_notice_without_catalog_starts_empty() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let notice = service.create_notice(NoticeDraft::new("First")).unwrap();
    assert!(notice.catalog.is_empty());
}

#[test]
fn new_notice_carries_forward_latest_catalog_as_copy() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let mut older = NoticeDraft::new("Edital 2025");
    older.catalog = Some(
        ActivityCatalog::from_categories(vec![ActivityCategory::new("Old", "count")]).unwrap(),
    );
    service.create_notice(older).unwrap();

    let mut latest = NoticeDraft::new("Edital 2026");
    latest.catalog = Some(sample_catalog());
    let prior = service.create_notice(latest).unwrap();

    let seeded = service.create_notice(NoticeDraft::new("Edital 2027")).unwrap();
    assert_eq!(shape(&seeded.catalog), shape(&prior.catalog));
    for activity in seeded.catalog.activities() {
        assert!(prior.catalog.find_activity(activity.id).is_none());
    }

    let category_id = seeded.catalog.categories()[0].id;
    service
        .edit_catalog(seeded.id, |catalog| catalog.remove_category(category_id))
        .unwrap();

    let prior_after = service.get_catalog(prior.id).unwrap();
    assert_eq!(prior_after, prior.catalog);
}

#[test]
fn notices_created_from_the_same_catalog_keep_separate_rows() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());
    let json = serde_json::to_string(&sample_catalog()).unwrap();

    let mut first = NoticeDraft::new("Edital 2026/1");
    first.catalog = Some(serde_json::from_str(&json).unwrap());
    let first = service.create_notice(first).unwrap();

    let mut second = NoticeDraft::new("Edital 2026/2");
    second.catalog = Some(serde_json::from_str(&json).unwrap());
    let second = service.create_notice(second).unwrap();

    assert_eq!(first.catalog, second.catalog);

    let category_id = second.catalog.categories()[0].id;
    let activity_id = second.catalog.categories()[0].activities[0].id;
    service
        .edit_catalog(second.id, |catalog| {
            catalog.update_activity(
                category_id,
                activity_id,
                ActivityDefinition::new("Journal paper (Q1)", 12, 36),
            )
        })
        .unwrap();
    service
        .edit_catalog(second.id, |catalog| {
            catalog.remove_category(second.catalog.categories()[1].id)
        })
        .unwrap();

    assert_eq!(service.get_catalog(first.id).unwrap(), first.catalog);
    let edited = service.get_catalog(second.id).unwrap();
    assert_eq!(edited.categories().len(), 1);
    assert_eq!(edited.find_activity(activity_id).unwrap().points, 12);
}

#[test]
fn deleted_notices_are_not_used_for_seeding() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let mut draft = NoticeDraft::new("Edital 2026");
    draft.catalog = Some(sample_catalog());
    let notice = service.create_notice(draft).unwrap();
    service.soft_delete_notice(notice.id).unwrap();

    assert!(service.seed_catalog(None).unwrap().is_empty());
}

#[test]
fn edit_catalog_persists_successful_edits() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());
    let notice = service.create_notice(NoticeDraft::new("Edital")).unwrap();

    let (category_id, _) = service
        .edit_catalog(notice.id, |catalog| {
            catalog.add_category(ActivityCategory::new("Teaching", "hours"))
        })
        .unwrap();
    let (activity_id, _) = service
        .edit_catalog(notice.id, |catalog| {
            catalog.add_activity(category_id, ActivityDefinition::new("Tutoring", 2, 10))
        })
        .unwrap();
    service
        .edit_catalog(notice.id, |catalog| {
            catalog.update_activity(
                category_id,
                activity_id,
                ActivityDefinition::new("Tutoring (hours)", 3, 12),
            )
        })
        .unwrap();

    let catalog = service.get_catalog(notice.id).unwrap();
    let activity = catalog.find_activity(activity_id).unwrap();
    assert_eq!(activity.name, "Tutoring (hours)");
    assert_eq!((activity.points, activity.limit), (3, 12));

    service
        .edit_catalog(notice.id, |catalog| catalog.remove_activity(category_id, activity_id))
        .unwrap();
    assert_eq!(service.get_catalog(notice.id).unwrap().activity_count(), 0);
}

#[test]
fn rejected_edit_leaves_stored_catalog_unchanged() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());
    let mut draft = NoticeDraft::new("Edital");
    draft.catalog = Some(sample_catalog());
    let notice = service.create_notice(draft).unwrap();

    let err = service
        .edit_catalog(notice.id, |catalog| {
            catalog.remove_category(notice.catalog.categories()[0].id)?;
            catalog.add_category(ActivityCategory::new("", "count"))
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Catalog(CatalogError::BlankCategoryName)
    ));

    assert_eq!(service.get_catalog(notice.id).unwrap(), notice.catalog);
}

#[test]
fn deleted_notice_cannot_be_edited_but_catalog_is_still_fetchable() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());
    let mut draft = NoticeDraft::new("Edital");
    draft.catalog = Some(sample_catalog());
    let notice = service.create_notice(draft).unwrap();

    service.soft_delete_notice(notice.id).unwrap();

    let err = service
        .edit_catalog(notice.id, |catalog| {
            catalog.add_category(ActivityCategory::new("Late", "count"))
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoticeDeleted(id) if id == notice.id));
    assert!(matches!(
        service.get_notice(notice.id, false),
        Err(ServiceError::NoticeNotFound(_))
    ));
    assert_eq!(service.get_catalog(notice.id).unwrap(), notice.catalog);
}

#[test]
fn missing_notice_maps_to_not_found() {
    let conn = setup();
    let repo = SqliteNoticeRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(
        repo.fetch_catalog(missing),
        Err(RepoError::NotFound { entity: "notice", id }) if id == missing
    ));
    assert!(matches!(
        repo.soft_delete_notice(missing, 1),
        Err(RepoError::NotFound { .. })
    ));

    let service = NoticeService::new(repo);
    assert!(matches!(
        service.get_catalog(missing),
        Err(ServiceError::NoticeNotFound(id)) if id == missing
    ));
}

#[test]
fn invalid_notice_is_rejected_before_write() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let mut draft = NoticeDraft::new("Edital");
    draft.opens_at = Some(200);
    draft.closes_at = Some(100);
    let err = service.create_notice(draft).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(NoticeValidationError::InvalidWindow { .. })
    ));

    let err = service.create_notice(NoticeDraft::new("  ")).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(NoticeValidationError::BlankTitle)
    ));

    assert!(service
        .list_notices(&NoticeListQuery {
            include_deleted: true,
            ..NoticeListQuery::default()
        })
        .unwrap()
        .is_empty());
}

#[test]
fn list_notices_is_most_recent_first_and_hides_deleted() {
    let conn = setup();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let first = service.create_notice(NoticeDraft::new("A")).unwrap();
    let second = service.create_notice(NoticeDraft::new("B")).unwrap();
    let third = service.create_notice(NoticeDraft::new("C")).unwrap();
    service.soft_delete_notice(second.id).unwrap();

    let visible: Vec<_> = service
        .list_notices(&NoticeListQuery::default())
        .unwrap()
        .into_iter()
        .map(|notice| notice.id)
        .collect();
    assert_eq!(visible, vec![third.id, first.id]);

    let page: Vec<_> = service
        .list_notices(&NoticeListQuery {
            include_deleted: true,
            limit: Some(1),
            offset: 1,
        })
        .unwrap()
        .into_iter()
        .map(|notice| notice.id)
        .collect();
    assert_eq!(page, vec![second.id]);
}

#[test]
fn latest_notice_can_exclude_the_notice_being_edited() {
    let conn = setup();
    let repo = SqliteNoticeRepository::try_new(&conn).unwrap();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());

    let mut older = NoticeDraft::new("Older");
    older.catalog = Some(sample_catalog());
    let older = service.create_notice(older).unwrap();
    let newer = service.create_notice(NoticeDraft::new("Newer")).unwrap();

    let latest = repo.latest_notice(Some(newer.id)).unwrap().unwrap();
    assert_eq!(latest.id, older.id);

    let seeded = service.seed_catalog(Some(newer.id)).unwrap();
    assert_eq!(shape(&seeded), shape(&older.catalog));
}

#[test]
fn soft_delete_keeps_first_timestamp() {
    let conn = setup();
    let repo = SqliteNoticeRepository::try_new(&conn).unwrap();
    let service = NoticeService::new(SqliteNoticeRepository::try_new(&conn).unwrap());
    let notice = service.create_notice(NoticeDraft::new("Edital")).unwrap();

    repo.soft_delete_notice(notice.id, 100).unwrap();
    repo.soft_delete_notice(notice.id, 200).unwrap();

    let loaded = repo.get_notice(notice.id, true).unwrap().unwrap();
    assert_eq!(loaded.lifecycle.deleted_at(), Some(100));
}
