//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the shareable, ownable entry record.
//! - Own the base64 codec applied to title/body at the storage boundary.
//!
//! # Invariants
//! - Title and body are persisted base64-encoded; domain code only ever sees
//!   the decoded text.
//! - `shared()` is derived: public, or at least one share-list member.

use crate::access::capability::ResourceKind;
use crate::model::principal::UserId;
use crate::model::record::{ManagedRecord, RecordMeta};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Ownable, shareable journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub meta: RecordMeta,
    /// Owning principal reference.
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    /// Public visibility flag; feeds the derived `shared` predicate only.
    pub public: bool,
    /// Principals granted read access.
    pub shared_with: Vec<UserId>,
    /// Tag names, normalized to lowercase.
    pub tags: Vec<String>,
}

impl Entry {
    /// Returns whether the entry is shared at all (public or listed).
    pub fn shared(&self) -> bool {
        self.public || !self.shared_with.is_empty()
    }
}

impl ManagedRecord for Entry {
    const KIND: ResourceKind = ResourceKind::Entry;

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
            title: String::new(),
            body: String::new(),
            public: false,
            shared_with: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

/// Encodes entry text for persistence.
pub fn encode_text(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}

/// Decodes persisted entry text.
///
/// Returns `None` when the stored value is not valid base64-wrapped UTF-8.
pub fn decode_text(stored: &str) -> Option<String> {
    if stored.is_empty() {
        return Some(String::new());
    }
    let bytes = BASE64.decode(stored.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}
