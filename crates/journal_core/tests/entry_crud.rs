use journal_core::db::open_db_in_memory;
use journal_core::model::entry::{decode_text, Entry};
use journal_core::model::user::User;
use journal_core::repo::entry_repo::SqliteEntryRepository;
use journal_core::repo::tag_repo::SqliteTagRepository;
use journal_core::repo::user_repo::SqliteUserRepository;
use journal_core::{
    resolve_scope, ManagedRecord, Principal, RecordStore, ResourceKind, RoleName, UserId,
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
    resolve_scope(&principal, ResourceKind::Entry, None).unwrap()
}

#[test]
fn insert_and_read_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let repo = SqliteEntryRepository::new(&conn);

    let mut entry = Entry::blank(Some(owner));
    entry.title = "First entry".to_string();
    entry.body = "A quiet day.\nNothing to report.".to_string();
    entry.tags = vec!["diary".to_string(), "home".to_string()];
    let id = repo.insert(&entry).unwrap();

    let loaded = repo.find_by_id(&owner_scope(owner), id).unwrap().unwrap();
    assert_eq!(loaded.title, "First entry");
    assert_eq!(loaded.body, "A quiet day.\nNothing to report.");
    assert_eq!(loaded.tags, vec!["diary", "home"]);
    assert!(!loaded.public);
    assert!(loaded.meta.active());
    assert!(loaded.meta.created_at > 0);
}

#[test]
fn stored_text_is_encoded_at_rest() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let repo = SqliteEntryRepository::new(&conn);

    let mut entry = Entry::blank(Some(owner));
    entry.title = "Plain title".to_string();
    entry.body = "Plain body".to_string();
    let id = repo.insert(&entry).unwrap();

    let (raw_title, raw_body): (String, String) = conn
        .query_row(
            "SELECT title, body FROM entries WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_ne!(raw_title, "Plain title");
    assert_ne!(raw_body, "Plain body");
    assert_eq!(decode_text(&raw_title).as_deref(), Some("Plain title"));
    assert_eq!(decode_text(&raw_body).as_deref(), Some("Plain body"));
}

#[test]
fn tag_links_resolve_against_the_owners_tags() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let repo = SqliteEntryRepository::new(&conn);

    let mut entry = Entry::blank(Some(owner));
    entry.title = "Tagged".to_string();
    entry.tags = vec!["travel".to_string()];
    repo.insert(&entry).unwrap();

    // The missing tag row was created for the owner.
    let (tag_owner, name): (i64, String) = conn
        .query_row("SELECT user_id, name FROM tags;", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(tag_owner, owner);
    assert_eq!(name, "travel");
}

#[test]
fn update_replaces_links_and_stamps_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let reader = seed_user(&conn, "reader@example.test");
    let repo = SqliteEntryRepository::new(&conn);

    let mut entry = Entry::blank(Some(owner));
    entry.title = "Draft".to_string();
    entry.tags = vec!["old".to_string()];
    let id = repo.insert(&entry).unwrap();

    let mut loaded = repo.reload(id, false).unwrap();
    assert_eq!(loaded.meta.updated_at, None);

    loaded.title = "Final".to_string();
    loaded.tags = vec!["new".to_string()];
    loaded.shared_with = vec![reader];
    repo.update(&loaded).unwrap();

    let stored = repo.reload(id, false).unwrap();
    assert_eq!(stored.title, "Final");
    assert_eq!(stored.tags, vec!["new"]);
    assert_eq!(stored.shared_with, vec![reader]);
    assert!(stored.meta.updated_at.is_some());
}

#[test]
fn entries_of_a_tag_hide_deleted_entries_unless_overridden() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let entries = SqliteEntryRepository::new(&conn);
    let tags = SqliteTagRepository::new(&conn);

    let mut kept = Entry::blank(Some(owner));
    kept.title = "kept".to_string();
    kept.tags = vec!["shared-tag".to_string()];
    entries.insert(&kept).unwrap();

    let mut doomed = Entry::blank(Some(owner));
    doomed.title = "doomed".to_string();
    doomed.tags = vec!["shared-tag".to_string()];
    let doomed_id = entries.insert(&doomed).unwrap();

    let mut to_delete = entries.reload(doomed_id, false).unwrap();
    to_delete.meta.delete(ResourceKind::Entry);
    entries.persist_lifecycle(&to_delete).unwrap();

    let tag_id: i64 = conn
        .query_row("SELECT id FROM tags WHERE name = 'shared-tag';", [], |row| {
            row.get(0)
        })
        .unwrap();

    let visible = tags.entries_for_tag(tag_id, false).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "kept");

    let all = tags.entries_for_tag(tag_id, true).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn deleted_tags_disappear_from_entry_tag_lists() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.test");
    let entries = SqliteEntryRepository::new(&conn);
    let tags = SqliteTagRepository::new(&conn);

    let mut entry = Entry::blank(Some(owner));
    entry.title = "entry".to_string();
    entry.tags = vec!["gone".to_string(), "here".to_string()];
    let id = entries.insert(&entry).unwrap();

    let gone_id: i64 = conn
        .query_row("SELECT id FROM tags WHERE name = 'gone';", [], |row| {
            row.get(0)
        })
        .unwrap();
    let mut gone = tags.reload(gone_id, false).unwrap();
    gone.meta.delete(ResourceKind::Tag);
    tags.persist_lifecycle(&gone).unwrap();

    let plain = entries.reload(id, false).unwrap();
    assert_eq!(plain.tags, vec!["here"]);

    let overridden = entries.reload(id, true).unwrap();
    assert_eq!(overridden.tags, vec!["gone", "here"]);
}
