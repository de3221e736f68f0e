//! Tag domain model.
//!
//! # Invariants
//! - Tag names are normalized to lowercase before persistence.
//! - `(name, user_id)` is unique per owner, including soft-deleted rows.

use crate::access::capability::ResourceKind;
use crate::model::principal::UserId;
use crate::model::record::{ManagedRecord, RecordMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Ownable tag attached to journal entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub meta: RecordMeta,
    /// Owning principal reference.
    pub user_id: UserId,
    /// Lowercase-normalized tag name.
    pub name: String,
}

impl ManagedRecord for Tag {
    const KIND: ResourceKind = ResourceKind::Tag;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn blank(owner: Option<UserId>) -> Self {
        Self {
            meta: RecordMeta::unsaved(),
            user_id: owner.unwrap_or_default(),
            name: String::new(),
        }
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Normalizes one tag name.
pub fn normalize_tag(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag names, preserving sorted order.
pub fn normalize_tags(names: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for name in names {
        if let Some(value) = normalize_tag(name) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag, normalize_tags};

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_tag("  Work "), Some("work".to_string()));
    }

    #[test]
    fn normalize_rejects_blank_names() {
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn normalize_tags_deduplicates() {
        let tags = vec![
            "Home".to_string(),
            "home".to_string(),
            " travel".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["home", "travel"]);
    }
}
