use biomark_core::db::open_db_in_memory;
use biomark_core::{
    BiomarkerCategory, BiomarkerRecord, CategoryRepository, EntityKind, RecordListQuery,
    RecordRepository, RecordService, RepoError, SqliteCategoryRepository, SqliteRecordRepository,
    SqliteTargetRepository, UserRef,
};
use rusqlite::Connection;
use uuid::Uuid;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const MARCH_1_2024_MS: i64 = 1_709_251_200_000;

fn seed_category(conn: &Connection, name: &str) -> BiomarkerCategory {
    let repo = SqliteCategoryRepository::try_new(conn).unwrap();
    let category = BiomarkerCategory::new(name, "mg/dL").with_reference_range(Some(70.0), Some(120.0));
    repo.create_category(&category).unwrap();
    category
}

fn user(name: &str) -> UserRef {
    UserRef::new(name).unwrap()
}

fn service(
    conn: &Connection,
) -> RecordService<SqliteRecordRepository<'_>, SqliteCategoryRepository<'_>, SqliteTargetRepository<'_>>
{
    RecordService::new(
        SqliteRecordRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteTargetRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn create_then_read_back_preserves_fields() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let record = BiomarkerRecord::new(user("alice"), glucose.id, 98.6, MARCH_1_2024_MS)
        .with_notes("after breakfast");
    let id = repo.create_record(&record).unwrap();

    let loaded = repo.get_record(id).unwrap().unwrap();
    assert_eq!(loaded.user, record.user);
    assert_eq!(loaded.category_id, record.category_id);
    assert_eq!(loaded.value, record.value);
    assert_eq!(loaded.date_recorded, record.date_recorded);
    assert_eq!(loaded.notes, record.notes);
    assert!(loaded.created_at.is_some());
    assert!(loaded.updated_at.is_some());
}

#[test]
fn out_of_range_values_are_accepted() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    for value in [-5.0, 0.0, 4_000.0] {
        repo.create_record(&BiomarkerRecord::new(user("alice"), glucose.id, value, 0))
            .unwrap();
    }
    assert_eq!(repo.list_records(&RecordListQuery::default()).unwrap().len(), 3);
}

#[test]
fn record_for_unknown_category_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo
        .create_record(&BiomarkerRecord::new(user("alice"), missing, 1.0, 0))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Category, id) if id == missing));
}

#[test]
fn list_orders_by_date_recorded_descending() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let older = BiomarkerRecord::new(user("alice"), glucose.id, 90.0, MARCH_1_2024_MS);
    let newest = BiomarkerRecord::new(user("alice"), glucose.id, 95.0, MARCH_1_2024_MS + 2 * DAY_MS);
    let middle = BiomarkerRecord::new(user("alice"), glucose.id, 92.0, MARCH_1_2024_MS + DAY_MS);
    for record in [&older, &newest, &middle] {
        repo.create_record(record).unwrap();
    }

    let ids: Vec<_> = repo
        .list_records(&RecordListQuery::default())
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, vec![newest.id, middle.id, older.id]);
}

#[test]
fn list_filters_by_user_category_and_date_range() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let ldl = seed_category(&conn, "LDL Cholesterol");
    let repo = SqliteRecordRepository::try_new(&conn).unwrap();

    let in_window = BiomarkerRecord::new(user("alice"), glucose.id, 90.0, MARCH_1_2024_MS + DAY_MS);
    let on_upper_edge =
        BiomarkerRecord::new(user("alice"), glucose.id, 91.0, MARCH_1_2024_MS + 3 * DAY_MS);
    let before_window = BiomarkerRecord::new(user("alice"), glucose.id, 92.0, MARCH_1_2024_MS - 1);
    let other_category = BiomarkerRecord::new(user("alice"), ldl.id, 130.0, MARCH_1_2024_MS + DAY_MS);
    let other_user = BiomarkerRecord::new(user("bob"), glucose.id, 99.0, MARCH_1_2024_MS + DAY_MS);
    for record in [&in_window, &on_upper_edge, &before_window, &other_category, &other_user] {
        repo.create_record(record).unwrap();
    }

    let query = RecordListQuery {
        user: Some(user("alice")),
        category_id: Some(glucose.id),
        recorded_from: Some(MARCH_1_2024_MS),
        recorded_to: Some(MARCH_1_2024_MS + 3 * DAY_MS),
        ..RecordListQuery::default()
    };
    let ids: Vec<_> = repo
        .list_records(&query)
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, vec![on_upper_edge.id, in_window.id]);
}

#[test]
fn search_covers_notes_user_and_category_name() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let ldl = seed_category(&conn, "LDL Cholesterol");
    let service = service(&conn);

    let fasting = service
        .create_record(
            &BiomarkerRecord::new(user("alice"), glucose.id, 88.0, MARCH_1_2024_MS)
                .with_notes("Fasting, morning"),
        )
        .unwrap();
    let cholesterol = service
        .create_record(&BiomarkerRecord::new(user("bob"), ldl.id, 140.0, MARCH_1_2024_MS))
        .unwrap();

    let by_notes = service.search_records("fasting", None).unwrap();
    assert_eq!(by_notes.len(), 1);
    assert_eq!(by_notes[0].id, fasting.id);

    let by_user = service.search_records("BOB", None).unwrap();
    assert_eq!(by_user.len(), 1);
    assert_eq!(by_user[0].id, cholesterol.id);

    let by_category = service.search_records("cholesterol", None).unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].id, cholesterol.id);

    assert!(service.search_records("alice cholesterol", None).unwrap().is_empty());
}

#[test]
fn update_changes_value_and_notes() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let service = service(&conn);

    let mut record = service
        .create_record(&BiomarkerRecord::new(user("alice"), glucose.id, 88.0, MARCH_1_2024_MS))
        .unwrap();
    record.value = 101.0;
    record.notes = "retest".to_string();
    let updated = service.update_record(&record).unwrap();

    assert_eq!(updated.value, 101.0);
    assert_eq!(updated.notes, "retest");
    assert_eq!(updated.date_recorded, MARCH_1_2024_MS);
}

#[test]
fn delete_record_and_missing_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let service = service(&conn);

    let record = service
        .create_record(&BiomarkerRecord::new(user("alice"), glucose.id, 88.0, MARCH_1_2024_MS))
        .unwrap();
    service.delete_record(record.id).unwrap();

    assert!(matches!(
        service.get_record(record.id),
        Err(RepoError::NotFound(EntityKind::Record, _))
    ));
    assert!(matches!(
        service.delete_record(record.id),
        Err(RepoError::NotFound(EntityKind::Record, _))
    ));
}

#[test]
fn default_page_is_capped_and_offset_reaches_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let service = service(&conn);

    for day in 0..105 {
        service
            .create_record(&BiomarkerRecord::new(
                user("alice"),
                glucose.id,
                90.0,
                MARCH_1_2024_MS + day * DAY_MS,
            ))
            .unwrap();
    }

    let first = service.list_record_views(&RecordListQuery::default()).unwrap();
    assert_eq!(first.len(), 100);

    let rest = service
        .list_record_views(&RecordListQuery {
            offset: 100,
            ..RecordListQuery::default()
        })
        .unwrap();
    assert_eq!(rest.len(), 5);
    assert_eq!(rest[4].record.date_recorded, MARCH_1_2024_MS);

    let everything = service
        .list_records(&RecordListQuery {
            limit: Some(500),
            ..RecordListQuery::default()
        })
        .unwrap();
    assert_eq!(everything.len(), 105);
}

#[test]
fn storage_timestamps_have_millisecond_resolution() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let service = service(&conn);

    let before = chrono::Utc::now().timestamp_millis();
    let mut record = service
        .create_record(&BiomarkerRecord::new(user("alice"), glucose.id, 88.0, MARCH_1_2024_MS))
        .unwrap();
    record.value = 89.0;
    let updated = service.update_record(&record).unwrap();
    let after = chrono::Utc::now().timestamp_millis();

    for stamp in [record.created_at, updated.updated_at] {
        let stamp = stamp.unwrap();
        assert!(
            (before - 1..=after + 1).contains(&stamp),
            "{stamp} not within [{before}, {after}]"
        );
    }
}
