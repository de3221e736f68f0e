use journal_core::db::open_db_in_memory;
use journal_core::model::tag::Tag;
use journal_core::model::user::User;
use journal_core::repo::tag_repo::SqliteTagRepository;
use journal_core::repo::user_repo::SqliteUserRepository;
use journal_core::{
    resolve_scope, ListOrder, ManagedRecord, PageRequest, Principal, RecordStore, RepoError,
    ResourceKind, RoleName, UserId,
};
use rusqlite::Connection;

fn seed_user(conn: &Connection, email: &str) -> UserId {
    let repo = SqliteUserRepository::new(conn);
    let mut user = User::blank(None);
    user.email = email.to_string();
    repo.insert(&user).unwrap()
}

fn owner_scope(owner: UserId) -> journal_core::AccessScope {
    let principal = Principal::new(owner, "owner@example.test", &[RoleName::User]);
    resolve_scope(&principal, ResourceKind::Tag, None).unwrap()
}

#[test]
fn insert_and_update_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let repo = SqliteTagRepository::new(&conn);

    let mut tag = Tag::blank(Some(owner));
    tag.name = "draft".to_string();
    let id = repo.insert(&tag).unwrap();

    let mut loaded = repo.find_by_id(&owner_scope(owner), id).unwrap().unwrap();
    assert_eq!(loaded.name, "draft");
    assert_eq!(loaded.meta.updated_at, None);

    loaded.name = "final".to_string();
    repo.update(&loaded).unwrap();

    let stored = repo.reload(id, false).unwrap();
    assert_eq!(stored.name, "final");
    assert!(stored.meta.updated_at.is_some());
}

#[test]
fn update_of_missing_tag_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed_user(&conn, "owner@example.test");
    let repo = SqliteTagRepository::new(&conn);

    let mut tag = Tag::blank(Some(1));
    tag.meta.id = 4242;
    tag.name = "ghost".to_string();
    let err = repo.update(&tag).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            kind: ResourceKind::Tag,
            id: 4242
        }
    ));
}

#[test]
fn duplicate_names_are_allowed_across_owners_only() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice@example.test");
    let bob = seed_user(&conn, "bob@example.test");
    let repo = SqliteTagRepository::new(&conn);

    let mut tag = Tag::blank(Some(alice));
    tag.name = "work".to_string();
    repo.insert(&tag).unwrap();

    let mut twin = Tag::blank(Some(bob));
    twin.name = "work".to_string();
    repo.insert(&twin).unwrap();

    let mut dup = Tag::blank(Some(alice));
    dup.name = "work".to_string();
    assert!(repo.insert(&dup).is_err());
}

#[test]
fn listing_orders_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let repo = SqliteTagRepository::new(&conn);

    for index in 0..15 {
        let mut tag = Tag::blank(Some(owner));
        tag.name = format!("tag-{index:02}");
        repo.insert(&tag).unwrap();
    }

    let scope = owner_scope(owner);
    let first = repo
        .list(
            &scope,
            &ListOrder::by("name", false),
            &PageRequest {
                page: 1,
                per_page: 10,
            },
        )
        .unwrap();
    assert_eq!(first.total, 15);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.pages(), 2);
    assert_eq!(first.items[0].name, "tag-00");

    let second = repo
        .list(
            &scope,
            &ListOrder::by("name", false),
            &PageRequest {
                page: 2,
                per_page: 10,
            },
        )
        .unwrap();
    assert_eq!(second.items.len(), 5);
    assert_eq!(second.items[0].name, "tag-10");

    let descending = repo
        .list(
            &scope,
            &ListOrder::by("name", true),
            &PageRequest::default(),
        )
        .unwrap();
    assert_eq!(descending.items[0].name, "tag-14");
}

#[test]
fn unknown_order_field_still_lists() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let repo = SqliteTagRepository::new(&conn);

    let mut tag = Tag::blank(Some(owner));
    tag.name = "solo".to_string();
    repo.insert(&tag).unwrap();

    let page = repo
        .list(
            &owner_scope(owner),
            &ListOrder::by("no_such_column", false),
            &PageRequest::default(),
        )
        .unwrap();
    assert_eq!(page.total, 1);
}
