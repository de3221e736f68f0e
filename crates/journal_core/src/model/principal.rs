//! Authenticated principals and role declarations.
//!
//! # Responsibility
//! - Define the role vocabulary used by every authorization decision.
//! - Provide the per-request principal passed explicitly into the access
//!   scope resolver and dispatcher (no process-wide principal state).
//!
//! # Invariants
//! - Role names have stable lowercase string ids; parsing is deterministic
//!   and rejects unknown or empty values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for a user row.
pub type UserId = i64;

/// Role used in authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Full access to non-ownable resource types.
    Admin,
    /// Sees soft-deleted rows and may restore deleted records.
    Manage,
    /// Basic role held by every user.
    User,
}

impl RoleName {
    /// Stable string id used in storage and role links.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_NAME_ADMIN,
            Self::Manage => ROLE_NAME_MANAGE,
            Self::User => ROLE_NAME_USER,
        }
    }

    /// User-facing role description, as seeded at bootstrap.
    pub fn description(self) -> &'static str {
        match self {
            Self::Admin => "Administrator: allows user management",
            Self::Manage => "Power User: can undelete their own records",
            Self::User => "Basic User: all users have this role",
        }
    }
}

/// Storage string value for the admin role.
pub const ROLE_NAME_ADMIN: &str = "admin";
/// Storage string value for the manage role.
pub const ROLE_NAME_MANAGE: &str = "manage";
/// Storage string value for the base user role.
pub const ROLE_NAME_USER: &str = "user";

const SUPPORTED_ROLE_NAMES: &[RoleName] = &[RoleName::Admin, RoleName::Manage, RoleName::User];

/// Returns all roles known by this build.
pub fn supported_role_names() -> &'static [RoleName] {
    SUPPORTED_ROLE_NAMES
}

/// Parses one role from its storage string value.
pub fn parse_role_name(value: &str) -> Result<RoleName, RoleNameError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(RoleNameError::EmptyRole);
    }

    match normalized {
        ROLE_NAME_ADMIN => Ok(RoleName::Admin),
        ROLE_NAME_MANAGE => Ok(RoleName::Manage),
        ROLE_NAME_USER => Ok(RoleName::User),
        other => Err(RoleNameError::UnsupportedRole(other.to_string())),
    }
}

/// Role parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleNameError {
    EmptyRole,
    UnsupportedRole(String),
}

impl Display for RoleNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRole => write!(f, "role name must not be empty"),
            Self::UnsupportedRole(value) => write!(f, "role name is unsupported: {value}"),
        }
    }
}

impl Error for RoleNameError {}

/// Authenticated caller carrying the role set used for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Backing user row id; used as the ownership reference.
    pub user_id: UserId,
    /// Login email, used only for diagnostics.
    pub email: String,
    roles: BTreeSet<RoleName>,
}

impl Principal {
    /// Builds a principal from a user id and its granted roles.
    pub fn new(user_id: UserId, email: impl Into<String>, roles: &[RoleName]) -> Self {
        Self {
            user_id,
            email: email.into(),
            roles: roles.iter().copied().collect(),
        }
    }

    /// Returns whether the principal holds the given role.
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    /// Granted roles in stable order.
    pub fn roles(&self) -> impl Iterator<Item = RoleName> + '_ {
        self.roles.iter().copied()
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User: {}", self.email)
    }
}
