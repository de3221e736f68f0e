use journal_core::db::open_db_in_memory;
use journal_core::repo::tag_repo::SqliteTagRepository;
use journal_core::repo::user_repo::SqliteUserRepository;
use journal_core::{
    resolve_scope, ManagedRecord, Principal, RecordStore, ResourceKind, RoleName, UserId,
};
use rusqlite::Connection;

fn seed_user(conn: &Connection, email: &str) -> UserId {
    let repo = SqliteUserRepository::new(conn);
    let mut user = journal_core::model::user::User::blank(None);
    user.email = email.to_string();
    repo.insert(&user).unwrap()
}

fn seed_tag(conn: &Connection, owner: UserId, name: &str) -> i64 {
    let repo = SqliteTagRepository::new(conn);
    let mut tag = journal_core::model::tag::Tag::blank(Some(owner));
    tag.name = name.to_string();
    repo.insert(&tag).unwrap()
}

#[test]
fn soft_delete_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let owner_id = seed_user(&conn, "owner@example.test");
    let tag_id = seed_tag(&conn, owner_id, "work");
    let repo = SqliteTagRepository::new(&conn);

    let owner = Principal::new(owner_id, "owner@example.test", &[RoleName::User]);
    let scope = resolve_scope(&owner, ResourceKind::Tag, None).unwrap();

    let mut tag = repo.find_by_id(&scope, tag_id).unwrap().unwrap();
    assert!(tag.meta.active());

    tag.meta.delete(ResourceKind::Tag);
    repo.persist_lifecycle(&tag).unwrap();

    // Plain read hides the deleted row.
    assert!(repo.find_by_id(&scope, tag_id).unwrap().is_none());

    // A manage principal reads it back, inactive.
    let power = Principal::new(
        owner_id,
        "owner@example.test",
        &[RoleName::User, RoleName::Manage],
    );
    let manage_scope = resolve_scope(&power, ResourceKind::Tag, None).unwrap();
    let hidden = repo.find_by_id(&manage_scope, tag_id).unwrap().unwrap();
    assert!(!hidden.meta.active());
    assert!(hidden.meta.deleted_at.is_some());
}

#[test]
fn repeated_delete_keeps_first_tombstone() {
    let conn = open_db_in_memory().unwrap();
    let owner_id = seed_user(&conn, "owner@example.test");
    let tag_id = seed_tag(&conn, owner_id, "twice");
    let repo = SqliteTagRepository::new(&conn);

    let mut tag = repo.reload(tag_id, false).unwrap();
    tag.meta.delete(ResourceKind::Tag);
    let first = tag.meta.deleted_at.unwrap();
    repo.persist_lifecycle(&tag).unwrap();

    tag.meta.delete(ResourceKind::Tag);
    assert_eq!(tag.meta.deleted_at, Some(first));
    repo.persist_lifecycle(&tag).unwrap();

    let stored = repo.reload(tag_id, true).unwrap();
    assert_eq!(stored.meta.deleted_at, Some(first));
}

#[test]
fn undelete_on_active_record_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let owner_id = seed_user(&conn, "owner@example.test");
    let tag_id = seed_tag(&conn, owner_id, "alive");
    let repo = SqliteTagRepository::new(&conn);

    let mut tag = repo.reload(tag_id, false).unwrap();
    tag.meta.undelete(ResourceKind::Tag);
    assert!(tag.meta.active());
    repo.persist_lifecycle(&tag).unwrap();

    let stored = repo.reload(tag_id, false).unwrap();
    assert_eq!(stored.meta.deleted_at, None);
}

#[test]
fn undelete_restores_default_visibility() {
    let conn = open_db_in_memory().unwrap();
    let owner_id = seed_user(&conn, "owner@example.test");
    let tag_id = seed_tag(&conn, owner_id, "phoenix");
    let repo = SqliteTagRepository::new(&conn);

    let owner = Principal::new(owner_id, "owner@example.test", &[RoleName::User]);
    let scope = resolve_scope(&owner, ResourceKind::Tag, None).unwrap();

    let mut tag = repo.reload(tag_id, false).unwrap();
    tag.meta.delete(ResourceKind::Tag);
    repo.persist_lifecycle(&tag).unwrap();
    assert!(repo.find_by_id(&scope, tag_id).unwrap().is_none());

    tag.meta.undelete(ResourceKind::Tag);
    repo.persist_lifecycle(&tag).unwrap();

    let restored = repo.find_by_id(&scope, tag_id).unwrap().unwrap();
    assert!(restored.meta.active());
}
