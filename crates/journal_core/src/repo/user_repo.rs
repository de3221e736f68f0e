//! User repository: SQLite persistence for user records and role links.
//!
//! # Responsibility
//! - Scoped user reads and writes on top of the `users` table.
//! - Role link maintenance and principal construction for request handling.
//!
//! # Invariants
//! - `security_token` is written once at insert and never updated.
//! - Principal construction rejects unknown role names stored in the link
//!   table instead of masking them.

use crate::access::capability::ResourceKind;
use crate::access::scope::{scope_clause, AccessScope};
use crate::model::principal::{parse_role_name, Principal, RoleName, UserId};
use crate::model::record::RecordId;
use crate::model::user::User;
use crate::repo::entry_repo::parse_record_meta;
use crate::repo::{
    ensure_scope_kind, ListOrder, Page, PageRequest, RecordStore, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    users.id,
    users.created_at,
    users.updated_at,
    users.deleted_at,
    users.email,
    users.password_hash,
    users.security_token,
    users.confirmed_at
FROM users";

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Looks a user up by unique email, regardless of lifecycle state.
    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE users.email = ?1;"))?;
        let mut rows = stmt.query(params![email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    /// Grants a role to a user. Idempotent for already-granted roles.
    pub fn assign_role(&self, user_id: UserId, role: RoleName) -> RepoResult<()> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO roles_users (user_id, role_id)
             SELECT ?1, id FROM roles WHERE name = ?2;",
            params![user_id, role.as_str()],
        )?;
        if changed == 0 {
            // Either the role row is missing (bootstrap failure) or the link
            // already exists; only the former is worth a diagnostic.
            log::debug!(
                "event=role_assign module=repo status=noop user_id={user_id} role={}",
                role.as_str()
            );
        }
        Ok(())
    }

    /// Builds the request principal for a user id.
    pub fn principal(&self, user_id: UserId) -> RepoResult<Principal> {
        let user = self.reload(user_id, true)?;

        let mut stmt = self.conn.prepare(
            "SELECT r.name
             FROM roles_users ru
             INNER JOIN roles r ON r.id = ru.role_id
             WHERE ru.user_id = ?1
             ORDER BY r.name ASC;",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let role = parse_role_name(&name).map_err(|err| {
                RepoError::InvalidData(format!("invalid role link for users.id={user_id}: {err}"))
            })?;
            roles.push(role);
        }

        Ok(Principal::new(user_id, user.email, &roles))
    }
}

impl RecordStore for SqliteUserRepository<'_> {
    type Record = User;

    fn find_by_id(&self, scope: &AccessScope, id: RecordId) -> RepoResult<Option<User>> {
        ensure_scope_kind(scope, ResourceKind::User)?;

        let mut clause = scope_clause(scope);
        clause.push_eq("users.id", Value::Integer(id));

        let sql = format!("{USER_SELECT_SQL}{};", clause.where_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(clause.binds))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn list(
        &self,
        scope: &AccessScope,
        order: &ListOrder,
        page: &PageRequest,
    ) -> RepoResult<Page<User>> {
        ensure_scope_kind(scope, ResourceKind::User)?;

        let clause = scope_clause(scope);
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM users{};", clause.where_sql()),
            params_from_iter(clause.binds.clone()),
            |row| row.get(0),
        )?;

        let mut sql = format!("{USER_SELECT_SQL}{}", clause.where_sql());
        if let Some(column) = order_column(&order.field) {
            let direction = if order.descending { " DESC" } else { "" };
            sql.push_str(&format!(" ORDER BY {column}{direction}, users.id ASC"));
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
            items.push(parse_user_row(row)?);
        }

        Ok(Page {
            items,
            page: page_number,
            per_page,
            total: total as u64,
        })
    }

    fn insert(&self, record: &User) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO users (email, password_hash, security_token, confirmed_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                record.email.as_str(),
                record.password_hash.as_str(),
                record.security_token.as_str(),
                record.confirmed_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, record: &User) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                email = ?2,
                password_hash = ?3,
                confirmed_at = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                record.meta.id,
                record.email.as_str(),
                record.password_hash.as_str(),
                record.confirmed_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::User,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn persist_lifecycle(&self, record: &User) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                deleted_at = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![record.meta.id, record.meta.deleted_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: ResourceKind::User,
                id: record.meta.id,
            });
        }
        Ok(())
    }

    fn reload(&self, id: RecordId, _include_deleted: bool) -> RepoResult<User> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE users.id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return parse_user_row(row);
        }

        Err(RepoError::NotFound {
            kind: ResourceKind::User,
            id,
        })
    }
}

fn order_column(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("users.id"),
        "email" => Some("users.email"),
        "created_at" => Some("users.created_at"),
        _ => None,
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        meta: parse_record_meta(row)?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        security_token: row.get("security_token")?,
        confirmed_at: row.get("confirmed_at")?,
    })
}
