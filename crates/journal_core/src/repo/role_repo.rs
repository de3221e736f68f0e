//! Role repository: SQLite persistence for the system-wide role records.

use crate::access::capability::ResourceKind;
use crate::access::scope::{scope_clause, AccessScope};
use crate::model::record::RecordId;
use crate::model::role::Role;
use crate::repo::entry_repo::parse_record_meta;
use crate::repo::{
    ensure_scope_kind, ListOrder, Page, PageRequest, RecordStore, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ROLE_SELECT_SQL: &str = "SELECT
    roles.id,
    roles.created_at,
    roles.updated_at,
    roles.deleted_at,
    roles.name,
    roles.description
FROM roles";

/// SQLite-backed role repository.
pub struct SqliteRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Looks a role up by its unique name, regardless of lifecycle state.
    pub fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROLE_SELECT_SQL} WHERE roles.name = ?1;"))?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_role_row(row)?));
        }
        Ok(None)
    }
}

impl RecordStore for SqliteRoleRepository<'_> {
    type Record = Role;

    fn find_by_id(&self, scope: &AccessScope, id: RecordId) -> RepoResult<Option<Role>> {
        ensure_scope_kind(scope, ResourceKind::Role)?;

        let mut clause = scope_clause(scope);
        clause.push_eq("roles.id", Value::Integer(id));

        let sql = format!("{ROLE_SELECT_SQL}{};", clause.where_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(clause.binds))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_role_row(row)?));
        }

        Ok(None)
    }

    fn list(
        &self,
        scope: &AccessScope,
        order: &ListOrder,
        page: &PageRequest,
    ) -> RepoResult<Page<Role>> {
        ensure_scope_kind(scope, ResourceKind::Role)?;

        let clause = scope_clause(scope);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM roles{};", clause.where_sql()),
            params_from_iter(clause.binds.clone()),
            |row| row.get(0),
        )?;

        let mut sql = format!("{ROLE_SELECT_SQL}{}", clause.where_sql());
        if let Some(column) = order_column(&order.field) {
            let direction = if order.descending { " DESC" } else { "" };
            sql.push_str(&format!(" ORDER BY {column}{direction}, roles.id ASC"));
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
            items.push(parse_role_row(row)?);
        }

        Ok(Page {
            items,
            page: page_number,
            per_page,
            total: total as u64,
        })
    }

    fn insert(&self, record: &Role) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO roles (name, description) VALUES (?1, ?2);",
            params![record.name.as_str(), record.description.as_deref()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, record: &Role) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE roles
             SET
                name = ?2,
                description = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                record.meta.id,
                record.name.as_str(),
                record.description.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::Role,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn persist_lifecycle(&self, record: &Role) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE roles
             SET
                deleted_at = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![record.meta.id, record.meta.deleted_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::Role,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn reload(&self, id: RecordId, _include_deleted: bool) -> RepoResult<Role> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROLE_SELECT_SQL} WHERE roles.id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return parse_role_row(row);
        }

        Err(RepoError::NotFound {
            kind: ResourceKind::Role,
            id,
        })
    }
}

fn order_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("roles.id"),
        "name" => Some("roles.name"),
        "created_at" => Some("roles.created_at"),
        _ => None,
    }
}

fn parse_role_row(row: &Row<'_>) -> RepoResult<Role> {
    Ok(Role {
        meta: parse_record_meta(row)?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}
