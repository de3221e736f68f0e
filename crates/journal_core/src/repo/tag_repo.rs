//! Tag repository: SQLite persistence for tags.
//!
//! # Responsibility
//! - Scoped tag reads and writes on top of the `tags` table.
//! - Entries-of-a-tag traversal with explicit soft-delete visibility on the
//!   joined entries.
//!
//! # Invariants
//! - `(name, user_id)` uniqueness is enforced by the schema, including
//!   soft-deleted rows.
//! - Tag names are persisted lowercase; forms normalize before populate.

use crate::access::capability::ResourceKind;
use crate::access::scope::{scope_clause, AccessScope};
use crate::model::entry::{decode_text, Entry};
use crate::model::record::RecordId;
use crate::model::tag::Tag;
use crate::repo::entry_repo::parse_record_meta;
use crate::repo::{
    bool_to_int, ensure_scope_kind, ListOrder, Page, PageRequest, RecordStore, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TAG_SELECT_SQL: &str = "SELECT
    tags.id,
    tags.created_at,
    tags.updated_at,
    tags.deleted_at,
    tags.user_id,
    tags.name
FROM tags";

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists the entries linked to a tag, hiding deleted entries unless the
    /// caller's soft-delete override is set.
    ///
    /// The tag itself must already have been fetched through a scoped read;
    /// this traversal does not re-apply the ownership predicate.
    pub fn entries_for_tag(
        &self,
        tag_id: RecordId,
        include_deleted: bool,
    ) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                entries.id,
                entries.created_at,
                entries.updated_at,
                entries.deleted_at,
                entries.user_id,
                entries.title,
                entries.body,
                entries.public
             FROM entry_tags et
             INNER JOIN entries ON entries.id = et.entry_id
             WHERE et.tag_id = ?1
               AND (?2 = 1 OR entries.deleted_at IS NULL)
             ORDER BY entries.id ASC;",
        )?;

        let mut rows = stmt.query(params![tag_id, bool_to_int(include_deleted)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let meta = parse_record_meta(row)?;
            let stored_title: String = row.get("title")?;
            let stored_body: String = row.get("body")?;
            let title = decode_text(&stored_title).ok_or_else(|| {
                RepoError::InvalidData(format!("undecodable title in entries.id={}", meta.id))
            })?;
            let body = decode_text(&stored_body).ok_or_else(|| {
                RepoError::InvalidData(format!("undecodable body in entries.id={}", meta.id))
            })?;
            entries.push(Entry {
                meta,
                user_id: row.get("user_id")?,
                title,
                body,
                public: row.get::<_, i64>("public")? != 0,
                shared_with: Vec::new(),
                tags: Vec::new(),
            });
        }
        Ok(entries)
    }
}

impl RecordStore for SqliteTagRepository<'_> {
    type Record = Tag;

    fn find_by_id(&self, scope: &AccessScope, id: RecordId) -> RepoResult<Option<Tag>> {
        ensure_scope_kind(scope, ResourceKind::Tag)?;

        let mut clause = scope_clause(scope);
        clause.push_eq("tags.id", Value::Integer(id));

        let sql = format!("{TAG_SELECT_SQL}{};", clause.where_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(clause.binds))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tag_row(row)?));
        }

        Ok(None)
    }

    fn list(
        &self,
        scope: &AccessScope,
        order: &ListOrder,
        page: &PageRequest,
    ) -> RepoResult<Page<Tag>> {
        ensure_scope_kind(scope, ResourceKind::Tag)?;

        let clause = scope_clause(scope);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM tags{};", clause.where_sql()),
            params_from_iter(clause.binds.clone()),
            |row| row.get(0),
        )?;

        let mut sql = format!("{TAG_SELECT_SQL}{}", clause.where_sql());
        if let Some(column) = order_column(&order.field) {
            let direction = if order.descending { " DESC" } else { "" };
            sql.push_str(&format!(" ORDER BY {column}{direction}, tags.id ASC"));
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
            items.push(parse_tag_row(row)?);
        }

        Ok(Page {
            items,
            page: page_number,
            per_page,
            total: total as u64,
        })
    }

    fn insert(&self, record: &Tag) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO tags (user_id, name) VALUES (?1, ?2);",
            params![record.user_id, record.name.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, record: &Tag) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tags
             SET
                name = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![record.meta.id, record.name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::Tag,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn persist_lifecycle(&self, record: &Tag) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tags
             SET
                deleted_at = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![record.meta.id, record.meta.deleted_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::Tag,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn reload(&self, id: RecordId, _include_deleted: bool) -> RepoResult<Tag> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TAG_SELECT_SQL} WHERE tags.id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return parse_tag_row(row);
        }

        Err(RepoError::NotFound {
            kind: ResourceKind::Tag,
            id,
        })
    }
}

fn order_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("tags.id"),
        "name" => Some("tags.name"),
        "created_at" => Some("tags.created_at"),
        "updated_at" => Some("tags.updated_at"),
        _ => None,
    }
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    Ok(Tag {
        meta: parse_record_meta(row)?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
    })
}
