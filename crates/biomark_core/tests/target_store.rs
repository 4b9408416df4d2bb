use biomark_core::db::open_db_in_memory;
use biomark_core::{
    BiomarkerCategory, CategoryRepository, Conflict, EntityKind, RepoError,
    SqliteCategoryRepository, SqliteTargetRepository, TargetListQuery, TargetRepository,
    TargetService, UserBiomarkerTarget, UserRef,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seed_category(conn: &Connection, name: &str) -> BiomarkerCategory {
    let repo = SqliteCategoryRepository::try_new(conn).unwrap();
    let category = BiomarkerCategory::new(name, "mg/dL").with_reference_range(Some(70.0), Some(120.0));
    repo.create_category(&category).unwrap();
    category
}

fn alice() -> UserRef {
    UserRef::new("alice").unwrap()
}

#[test]
fn second_target_for_same_pair_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteTargetRepository::try_new(&conn).unwrap();

    repo.create_target(&UserBiomarkerTarget::new(alice(), glucose.id, 95.0, 5.0))
        .unwrap();
    let err = repo
        .create_target(&UserBiomarkerTarget::new(alice(), glucose.id, 90.0, 2.0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Conflict(Conflict::UserTarget { ref user, category_id })
            if user.as_str() == "alice" && category_id == glucose.id
    ));

    let stored = repo.find_target(&alice(), glucose.id).unwrap().unwrap();
    assert_eq!(stored.target_value, 95.0);
}

#[test]
fn same_category_for_different_users_is_allowed() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteTargetRepository::try_new(&conn).unwrap();

    repo.create_target(&UserBiomarkerTarget::new(alice(), glucose.id, 95.0, 5.0))
        .unwrap();
    repo.create_target(&UserBiomarkerTarget::new(
        UserRef::new("bob").unwrap(),
        glucose.id,
        100.0,
        10.0,
    ))
    .unwrap();

    let all = repo
        .list_targets(&TargetListQuery {
            category_id: Some(glucose.id),
            ..TargetListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].user.as_str(), "alice");
    assert_eq!(all[1].user.as_str(), "bob");
}

#[test]
fn missing_target_lookup_is_none_not_error() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteTargetRepository::try_new(&conn).unwrap();

    assert!(repo.find_target(&alice(), glucose.id).unwrap().is_none());
}

#[test]
fn target_for_unknown_category_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTargetRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo
        .create_target(&UserBiomarkerTarget::new(alice(), missing, 1.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Category, id) if id == missing));
}

#[test]
fn negative_acceptable_range_blocks_write() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let repo = SqliteTargetRepository::try_new(&conn).unwrap();

    let err = repo
        .create_target(&UserBiomarkerTarget::new(alice(), glucose.id, 95.0, -1.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.find_target(&alice(), glucose.id).unwrap().is_none());
}

#[test]
fn update_and_delete_target() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let service = TargetService::new(SqliteTargetRepository::try_new(&conn).unwrap());

    let mut target = service
        .create_target(&UserBiomarkerTarget::new(alice(), glucose.id, 95.0, 5.0))
        .unwrap();
    target.target_value = 92.0;
    target.acceptable_range = 3.0;
    let updated = service.update_target(&target).unwrap();
    assert_eq!(updated.target_value, 92.0);
    assert_eq!(updated.acceptable_range, 3.0);

    service.delete_target(target.id).unwrap();
    assert!(service.lookup_target(&alice(), glucose.id).unwrap().is_none());
    assert!(matches!(
        service.delete_target(target.id),
        Err(RepoError::NotFound(EntityKind::Target, _))
    ));
}

#[test]
fn set_personal_target_inserts_then_overwrites() {
    let conn = open_db_in_memory().unwrap();
    let glucose = seed_category(&conn, "Glucose");
    let service = TargetService::new(SqliteTargetRepository::try_new(&conn).unwrap());

    let first = service
        .set_personal_target(&alice(), glucose.id, 95.0, 5.0)
        .unwrap();
    let second = service
        .set_personal_target(&alice(), glucose.id, 88.0, 4.0)
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.target_value, 88.0);
    assert_eq!(second.acceptable_range, 4.0);
    assert_eq!(
        service
            .list_targets(&TargetListQuery {
                user: Some(alice()),
                ..TargetListQuery::default()
            })
            .unwrap()
            .len(),
        1
    );
}
