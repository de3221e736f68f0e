//! Static capability declarations per managed resource kind.
//!
//! # Responsibility
//! - Declare, per resource *type*, whether instances are ownable and/or
//!   shareable.
//! - Expose the table and share-link metadata the scope resolver needs to
//!   build row predicates.
//!
//! # Invariants
//! - `shareable` implies `ownable`; enforced by the descriptor constructors.
//! - The table is immutable process-wide configuration, established at
//!   compile time and read-only at request time.
//! - Pure association tables (`entry_tags`, `shared_entries`, `roles_users`)
//!   are not resource kinds and are never visibility-filtered.

/// Managed resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Entry,
    Tag,
    User,
    Role,
}

impl ResourceKind {
    /// Display name used in user-facing messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Tag => "Tag",
            Self::User => "User",
            Self::Role => "Role",
        }
    }

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Entry => "entries",
            Self::Tag => "tags",
            Self::User => "users",
            Self::Role => "roles",
        }
    }

    /// Share-link table and its foreign-key column, for shareable kinds.
    pub fn share_table(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Entry => Some(("shared_entries", "entry_id")),
            _ => None,
        }
    }
}

/// Per-kind capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Instances carry exactly one owning principal reference.
    pub ownable: bool,
    /// Instances can grant read access to other principals.
    pub shareable: bool,
}

impl Capabilities {
    /// System-wide resource: no owner, admin-gated.
    pub const fn system() -> Self {
        Self {
            ownable: false,
            shareable: false,
        }
    }

    /// Single-owner resource.
    pub const fn ownable() -> Self {
        Self {
            ownable: true,
            shareable: false,
        }
    }

    /// Single-owner resource with a share list.
    pub const fn shareable() -> Self {
        Self {
            ownable: true,
            shareable: true,
        }
    }
}

/// Returns the capability flags declared for the kind.
pub fn capabilities(kind: ResourceKind) -> Capabilities {
    match kind {
        ResourceKind::Entry => Capabilities::shareable(),
        ResourceKind::Tag => Capabilities::ownable(),
        ResourceKind::User | ResourceKind::Role => Capabilities::system(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capabilities, Capabilities, ResourceKind};

    #[test]
    fn entry_is_ownable_and_shareable() {
        assert_eq!(capabilities(ResourceKind::Entry), Capabilities::shareable());
    }

    #[test]
    fn tag_is_ownable_only() {
        let caps = capabilities(ResourceKind::Tag);
        assert!(caps.ownable);
        assert!(!caps.shareable);
    }

    #[test]
    fn user_and_role_are_system_kinds() {
        for kind in [ResourceKind::User, ResourceKind::Role] {
            let caps = capabilities(kind);
            assert!(!caps.ownable);
            assert!(!caps.shareable);
        }
    }

    #[test]
    fn shareable_implies_ownable_for_every_kind() {
        for kind in [
            ResourceKind::Entry,
            ResourceKind::Tag,
            ResourceKind::User,
            ResourceKind::Role,
        ] {
            let caps = capabilities(kind);
            assert!(!caps.shareable || caps.ownable);
        }
    }

    #[test]
    fn only_shareable_kinds_declare_a_share_table() {
        assert!(ResourceKind::Entry.share_table().is_some());
        assert!(ResourceKind::Tag.share_table().is_none());
        assert!(ResourceKind::Role.share_table().is_none());
    }
}
