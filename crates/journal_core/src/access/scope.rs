//! Access scope resolution and the soft-delete visibility filter.
//!
//! # Responsibility
//! - Turn (principal, resource kind, shared mode) into the row-selection
//!   predicate every read path must apply.
//! - Build the explicit SQL realization of that predicate, including the
//!   soft-delete clause. There is no implicit query interception: every
//!   repository read visibly requests or declines the deleted-row override.
//!
//! # Invariants
//! - `include_deleted` derives solely from the `manage` role, never from
//!   client input.
//! - Non-ownable kinds reject non-admin principals with `Forbidden` before
//!   any row is touched; instance-level misses elsewhere surface as absent
//!   rows (and 404 at the dispatcher), never as `Forbidden`.
//! - Shared predicates are only produced for kinds that declare a share
//!   table.

use crate::access::capability::{capabilities, ResourceKind};
use crate::model::principal::{Principal, RoleName, UserId};
use log::debug;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row-selection predicate resolved for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePredicate {
    /// No ownership restriction (admin access to a system kind).
    Unrestricted,
    /// Rows owned by the principal.
    Owner(UserId),
    /// Rows owned by the principal or shared with it.
    OwnerOrShared(UserId),
    /// Rows shared with the principal only ("shared with me" listing).
    SharedOnly(UserId),
}

/// Resolved access scope for one (principal, kind) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessScope {
    pub kind: ResourceKind,
    pub predicate: ScopePredicate,
    /// Soft-delete override; true only for `manage` principals.
    pub include_deleted: bool,
}

/// Scope resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Principal has no access to the entire resource kind.
    Forbidden { kind: ResourceKind },
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { kind } => {
                write!(f, "Unable to Access Resource {}", kind.as_str())
            }
        }
    }
}

impl Error for AccessError {}

/// Resolves the row-selection predicate for a principal and resource kind.
///
/// `shared_mode` selects among the owned/shared unions for shareable kinds:
/// `None` unions owned and shared rows, `Some(true)` restricts to rows
/// shared with the principal, `Some(false)` restricts to owned rows. It is
/// ignored for kinds without a share list.
///
/// # Errors
/// - `AccessError::Forbidden` when a non-admin principal addresses a
///   non-ownable kind. This is a distinct hard failure, not an empty result.
pub fn resolve_scope(
    principal: &Principal,
    kind: ResourceKind,
    shared_mode: Option<bool>,
) -> Result<AccessScope, AccessError> {
    let caps = capabilities(kind);
    let include_deleted = principal.has_role(RoleName::Manage);

    let predicate = if !caps.ownable {
        if !principal.has_role(RoleName::Admin) {
            debug!(
                "event=scope_resolve module=access status=forbidden kind={} user_id={}",
                kind.as_str(),
                principal.user_id
            );
            return Err(AccessError::Forbidden { kind });
        }
        ScopePredicate::Unrestricted
    } else if caps.shareable {
        match shared_mode {
            Some(true) => ScopePredicate::SharedOnly(principal.user_id),
            Some(false) => ScopePredicate::Owner(principal.user_id),
            None => ScopePredicate::OwnerOrShared(principal.user_id),
        }
    } else {
        ScopePredicate::Owner(principal.user_id)
    };

    Ok(AccessScope {
        kind,
        predicate,
        include_deleted,
    })
}

/// SQL WHERE fragment plus its bind values.
#[derive(Debug, Clone, Default)]
pub struct ScopeClause {
    pub conditions: Vec<String>,
    pub binds: Vec<Value>,
}

impl ScopeClause {
    /// Appends one caller-supplied equality filter.
    pub fn push_eq(&mut self, column: &str, value: Value) {
        self.conditions.push(format!("{column} = ?"));
        self.binds.push(value);
    }

    /// Renders the combined `WHERE` clause, or an empty string when
    /// unconstrained.
    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// Builds the WHERE fragment realizing the scope for its backing table.
///
/// The soft-delete condition is always appended unless the scope carries the
/// deleted-row override; ownership and share-membership conditions follow the
/// resolved predicate. Share predicates assume the kind declares a share
/// table, which `resolve_scope` guarantees.
pub fn scope_clause(scope: &AccessScope) -> ScopeClause {
    let table = scope.kind.table();
    let mut clause = ScopeClause::default();

    if !scope.include_deleted {
        clause
            .conditions
            .push(format!("{table}.deleted_at IS NULL"));
    }

    match scope.predicate {
        ScopePredicate::Unrestricted => {}
        ScopePredicate::Owner(user_id) => {
            clause.push_eq(&format!("{table}.user_id"), Value::Integer(user_id));
        }
        ScopePredicate::OwnerOrShared(user_id) => {
            if let Some(membership) = share_membership_sql(scope.kind) {
                clause
                    .conditions
                    .push(format!("({table}.user_id = ? OR {membership})"));
                clause.binds.push(Value::Integer(user_id));
                clause.binds.push(Value::Integer(user_id));
            } else {
                clause.push_eq(&format!("{table}.user_id"), Value::Integer(user_id));
            }
        }
        ScopePredicate::SharedOnly(user_id) => {
            if let Some(membership) = share_membership_sql(scope.kind) {
                clause.conditions.push(membership);
                clause.binds.push(Value::Integer(user_id));
            } else {
                clause.push_eq(&format!("{table}.user_id"), Value::Integer(user_id));
            }
        }
    }

    clause
}

fn share_membership_sql(kind: ResourceKind) -> Option<String> {
    kind.share_table().map(|(share_table, fk_column)| {
        format!(
            "EXISTS (SELECT 1 FROM {share_table} s \
             WHERE s.{fk_column} = {table}.id AND s.user_id = ?)",
            table = kind.table()
        )
    })
}
