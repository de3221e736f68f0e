//! Entry repository: SQLite persistence for journal entries.
//!
//! # Responsibility
//! - Scoped entry reads and writes on top of the `entries` table.
//! - Base64 encode/decode of title/body at the SQL boundary.
//! - Atomic replacement of tag and share links alongside field updates.
//!
//! # Invariants
//! - Every read applies the caller's `AccessScope` (ownership predicate and
//!   soft-delete visibility) before any column is exposed.
//! - Tag links resolve against the entry owner's tags, creating missing ones.
//! - Field update plus `updated_at` stamping happens in one statement or one
//!   immediate transaction.

use crate::access::capability::ResourceKind;
use crate::access::scope::{scope_clause, AccessScope};
use crate::model::entry::{decode_text, encode_text, Entry};
use crate::model::principal::UserId;
use crate::model::record::{RecordId, RecordMeta};
use crate::repo::{
    bool_to_int, ensure_scope_kind, ListOrder, Page, PageRequest, RecordStore, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ENTRY_SELECT_SQL: &str = "SELECT
    entries.id,
    entries.created_at,
    entries.updated_at,
    entries.deleted_at,
    entries.user_id,
    entries.title,
    entries.body,
    entries.public
FROM entries";

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn immediate_tx(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn load_entry_row(&self, row: &Row<'_>, include_deleted: bool) -> RepoResult<Entry> {
        let mut entry = parse_entry_row(row)?;
        entry.tags = load_tags_for_entry(self.conn, entry.meta.id, include_deleted)?;
        entry.shared_with = load_share_list(self.conn, entry.meta.id)?;
        Ok(entry)
    }
}

impl RecordStore for SqliteEntryRepository<'_> {
    type Record = Entry;

    fn find_by_id(&self, scope: &AccessScope, id: RecordId) -> RepoResult<Option<Entry>> {
        ensure_scope_kind(scope, ResourceKind::Entry)?;

        let mut clause = scope_clause(scope);
        clause.push_eq("entries.id", Value::Integer(id));

        let sql = format!("{ENTRY_SELECT_SQL}{};", clause.where_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(clause.binds))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.load_entry_row(row, scope.include_deleted)?));
        }

        Ok(None)
    }

    fn list(
        &self,
        scope: &AccessScope,
        order: &ListOrder,
        page: &PageRequest,
    ) -> RepoResult<Page<Entry>> {
        ensure_scope_kind(scope, ResourceKind::Entry)?;

        let clause = scope_clause(scope);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM entries{};", clause.where_sql()),
            params_from_iter(clause.binds.clone()),
            |row| row.get(0),
        )?;

        let mut sql = format!("{ENTRY_SELECT_SQL}{}", clause.where_sql());
        if let Some(column) = order_column(&order.field) {
            let direction = if order.descending { " DESC" } else { "" };
            sql.push_str(&format!(
                " ORDER BY {column}{direction}, entries.id ASC"
            ));
        }
        let (page_number, per_page) = page.normalized();
        sql.push_str(" LIMIT ? OFFSET ?;");

        let mut binds = clause.binds;
        binds.push(Value::Integer(i64::from(per_page)));
        binds.push(Value::Integer(page.offset() as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(self.load_entry_row(row, scope.include_deleted)?);
        }

        Ok(Page {
            items,
            page: page_number,
            per_page,
            total: total as u64,
        })
    }

    fn insert(&self, record: &Entry) -> RepoResult<RecordId> {
        let tx = self.immediate_tx()?;
        tx.execute(
            "INSERT INTO entries (user_id, title, body, public) VALUES (?1, ?2, ?3, ?4);",
            params![
                record.user_id,
                encode_text(&record.title),
                encode_text(&record.body),
                bool_to_int(record.public),
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_tag_links(&tx, id, record.user_id, &record.tags)?;
        replace_share_links(&tx, id, &record.shared_with)?;
        tx.commit()?;
        Ok(id)
    }

    fn update(&self, record: &Entry) -> RepoResult<()> {
        let tx = self.immediate_tx()?;
        let changed = tx.execute(
            "UPDATE entries
             SET
                title = ?2,
                body = ?3,
                public = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                record.meta.id,
                encode_text(&record.title),
                encode_text(&record.body),
                bool_to_int(record.public),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::Entry,
                id: record.meta.id,
            });
        }

        replace_tag_links(&tx, record.meta.id, record.user_id, &record.tags)?;
        replace_share_links(&tx, record.meta.id, &record.shared_with)?;
        tx.commit()?;
        Ok(())
    }

    fn persist_lifecycle(&self, record: &Entry) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE entries
             SET
                deleted_at = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![record.meta.id, record.meta.deleted_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::Entry,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn reload(&self, id: RecordId, include_deleted: bool) -> RepoResult<Entry> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE entries.id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return self.load_entry_row(row, include_deleted);
        }

        Err(RepoError::NotFound {
            kind: ResourceKind::Entry,
            id,
        })
    }
}

fn order_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("entries.id"),
        "created_at" => Some("entries.created_at"),
        "updated_at" => Some("entries.updated_at"),
        _ => None,
    }
}

pub(crate) fn parse_record_meta(row: &Row<'_>) -> RepoResult<RecordMeta> {
    Ok(RecordMeta {
        id: row.get("id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let meta = parse_record_meta(row)?;
    let stored_title: String = row.get("title")?;
    let stored_body: String = row.get("body")?;
    let title = decode_text(&stored_title).ok_or_else(|| {
        RepoError::InvalidData(format!("undecodable title in entries.id={}", meta.id))
    })?;
    let body = decode_text(&stored_body).ok_or_else(|| {
        RepoError::InvalidData(format!("undecodable body in entries.id={}", meta.id))
    })?;

    Ok(Entry {
        meta,
        user_id: row.get("user_id")?,
        title,
        body,
        public: row.get::<_, i64>("public")? != 0,
        shared_with: Vec::new(),
        tags: Vec::new(),
    })
}

/// Loads an entry's tag names, hiding deleted tags unless overridden.
fn load_tags_for_entry(
    conn: &Connection,
    entry_id: RecordId,
    include_deleted: bool,
) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM entry_tags et
         INNER JOIN tags t ON t.id = et.tag_id
         WHERE et.entry_id = ?1
           AND (?2 = 1 OR t.deleted_at IS NULL)
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query(params![entry_id, bool_to_int(include_deleted)])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        tags.push(name);
    }
    Ok(tags)
}

fn load_share_list(conn: &Connection, entry_id: RecordId) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM shared_entries WHERE entry_id = ?1 ORDER BY user_id ASC;",
    )?;
    let mut rows = stmt.query(params![entry_id])?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        users.push(row.get(0)?);
    }
    Ok(users)
}

/// Replaces the whole tag-link set, resolving names to the owner's tags and
/// creating missing ones.
fn replace_tag_links(
    tx: &Transaction<'_>,
    entry_id: RecordId,
    owner: UserId,
    tags: &[String],
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM entry_tags WHERE entry_id = ?1;",
        params![entry_id],
    )?;

    for name in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (user_id, name) VALUES (?1, ?2);",
            params![owner, name.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO entry_tags (entry_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE user_id = ?2 AND name = ?3;",
            params![entry_id, owner, name.as_str()],
        )?;
    }

    Ok(())
}

fn replace_share_links(
    tx: &Transaction<'_>,
    entry_id: RecordId,
    shared_with: &[UserId],
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM shared_entries WHERE entry_id = ?1;",
        params![entry_id],
    )?;

    for user_id in shared_with {
        // Surface a bad share target as its own error instead of letting
        // the foreign key constraint abort the statement.
        let known: i64 = tx.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1;",
            params![user_id],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(RepoError::UnknownShareTarget { id: *user_id });
        }
        tx.execute(
            "INSERT OR IGNORE INTO shared_entries (entry_id, user_id) VALUES (?1, ?2);",
            params![entry_id, user_id],
        )?;
    }

    Ok(())
}
