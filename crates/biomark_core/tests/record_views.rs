use biomark_core::db::open_db_in_memory;
use biomark_core::{
    BiomarkerCategory, BiomarkerRecord, CategoryRepository, EntityKind, MeasurementStatus,
    RecordListQuery, RecordService, RepoError, SqliteCategoryRepository, SqliteRecordRepository,
    SqliteTargetRepository, TargetRangeCheck, TargetRepository, TargetSource,
    UserBiomarkerTarget, UserRef,
};
use rusqlite::Connection;
use uuid::Uuid;

const MARCH_5_2024_MS: i64 = 1_709_634_600_000;

fn glucose() -> BiomarkerCategory {
    BiomarkerCategory::new("Fasting Glucose", "mg/dL")
        .with_reference_range(Some(70.0), Some(120.0))
        .with_default_target(100.0, Some(5.0))
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

fn record_value(
    conn: &Connection,
    user: &str,
    category: &BiomarkerCategory,
    value: f64,
) -> BiomarkerRecord {
    let record = BiomarkerRecord::new(UserRef::new(user).unwrap(), category.id, value, MARCH_5_2024_MS);
    service(conn).create_record(&record).unwrap()
}

#[test]
fn value_under_reference_minimum_is_below_range() {
    let conn = open_db_in_memory().unwrap();
    let category = glucose();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();

    let record = record_value(&conn, "alice", &category, 65.0);
    let view = service(&conn).view_record(record.id).unwrap();

    assert!(!view.evaluation.is_within_reference_range());
    assert_eq!(view.evaluation.status, MeasurementStatus::BelowRange);
    assert_eq!(view.evaluation.status.label(), "Below Range");
}

#[test]
fn category_default_target_applies_without_personal_target() {
    let conn = open_db_in_memory().unwrap();
    let category = glucose();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();

    let record = record_value(&conn, "alice", &category, 90.0);
    let view = service(&conn).view_record(record.id).unwrap();

    let resolved = view.evaluation.resolved_target.unwrap();
    assert_eq!(resolved.source, TargetSource::CategoryDefault);
    assert_eq!(view.evaluation.target, TargetRangeCheck::Outside);
    assert_eq!(view.evaluation.status, MeasurementStatus::BelowTarget);
}

#[test]
fn personal_target_takes_precedence_over_default() {
    let conn = open_db_in_memory().unwrap();
    let category = glucose();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();
    SqliteTargetRepository::try_new(&conn)
        .unwrap()
        .create_target(&UserBiomarkerTarget::new(
            UserRef::new("alice").unwrap(),
            category.id,
            88.0,
            3.0,
        ))
        .unwrap();

    let alice = record_value(&conn, "alice", &category, 90.0);
    let bob = record_value(&conn, "bob", &category, 90.0);
    let service = service(&conn);

    let alice_view = service.view_record(alice.id).unwrap();
    assert_eq!(
        alice_view.evaluation.resolved_target.unwrap().source,
        TargetSource::Personal
    );
    assert_eq!(alice_view.evaluation.target, TargetRangeCheck::Within);
    assert_eq!(alice_view.evaluation.status, MeasurementStatus::AboveTarget);

    let bob_view = service.view_record(bob.id).unwrap();
    assert_eq!(
        bob_view.evaluation.resolved_target.unwrap().source,
        TargetSource::CategoryDefault
    );
    assert_eq!(bob_view.evaluation.target, TargetRangeCheck::Outside);
}

#[test]
fn category_without_targets_reports_no_target() {
    let conn = open_db_in_memory().unwrap();
    let category =
        BiomarkerCategory::new("Ferritin", "ng/mL").with_reference_range(Some(30.0), Some(400.0));
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();

    let record = record_value(&conn, "alice", &category, 120.0);
    let view = service(&conn).view_record(record.id).unwrap();

    assert!(view.evaluation.resolved_target.is_none());
    assert_eq!(view.evaluation.target, TargetRangeCheck::NoTarget);
    assert_eq!(view.evaluation.status, MeasurementStatus::WithinRange);
}

#[test]
fn view_display_combines_label_and_status() {
    let conn = open_db_in_memory().unwrap();
    let category = glucose();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();

    let record = record_value(&conn, "alice", &category, 100.0);
    let view = service(&conn).view_record(record.id).unwrap();

    assert_eq!(
        view.to_string(),
        "Fasting Glucose: 100 mg/dL (2024-03-05) [At Target]"
    );
}

#[test]
fn list_views_evaluate_every_record() {
    let conn = open_db_in_memory().unwrap();
    let category = glucose();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();

    record_value(&conn, "alice", &category, 65.0);
    record_value(&conn, "alice", &category, 130.0);
    record_value(&conn, "alice", &category, 103.0);

    let mut statuses: Vec<_> = service(&conn)
        .list_record_views(&RecordListQuery::default())
        .unwrap()
        .into_iter()
        .map(|view| view.evaluation.status)
        .collect();
    statuses.sort_by_key(|status| status.label());

    assert_eq!(
        statuses,
        vec![
            MeasurementStatus::AboveRange,
            MeasurementStatus::AboveTarget,
            MeasurementStatus::BelowRange,
        ]
    );
}

#[test]
fn view_of_missing_record_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(
        service(&conn).view_record(missing),
        Err(RepoError::NotFound(EntityKind::Record, id)) if id == missing
    ));
}

#[test]
fn evaluation_serializes_with_snake_case_tags() {
    let conn = open_db_in_memory().unwrap();
    let category = glucose();
    SqliteCategoryRepository::try_new(&conn)
        .unwrap()
        .create_category(&category)
        .unwrap();

    let record = record_value(&conn, "alice", &category, 90.0);
    let view = service(&conn).view_record(record.id).unwrap();
    let json = serde_json::to_value(view.evaluation).unwrap();

    assert_eq!(json["reference"], "within");
    assert_eq!(json["target"], "outside");
    assert_eq!(json["status"], "below_target");
    assert_eq!(json["resolved_target"]["source"], "category_default");
}
