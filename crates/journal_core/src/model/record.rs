//! Record lifecycle metadata shared by every managed resource.
//!
//! # Responsibility
//! - Define the persisted metadata shape (id, created/updated/deleted stamps).
//! - Own the soft-delete lifecycle transitions.
//!
//! # Invariants
//! - `id` is assigned by storage at insert and never reused.
//! - `active()` is derived: a record is active iff `deleted_at` is absent.
//! - `delete`/`undelete` are the only code paths that touch `deleted_at`.
//! - Both transitions are idempotent no-ops when the record is already in the
//!   target state; the no-op is logged, never escalated.

use crate::access::capability::ResourceKind;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stable surrogate identifier for every managed record.
pub type RecordId = i64;

/// Metadata attribute names that must never be written from user input.
pub const IMMUTABLE_ATTRS: &[&str] = &["id", "created_at", "updated_at", "deleted_at"];

/// Lifecycle metadata embedded in every managed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Storage-assigned surrogate id. `0` until first persisted.
    pub id: RecordId,
    /// Creation stamp in epoch milliseconds, set once by storage.
    pub created_at: i64,
    /// Last mutation stamp in epoch milliseconds; absent until first update.
    pub updated_at: Option<i64>,
    /// Soft-delete tombstone; absent while the record is active.
    pub deleted_at: Option<i64>,
}

impl RecordMeta {
    /// Metadata for a record that has not been persisted yet.
    pub fn unsaved() -> Self {
        Self {
            id: 0,
            created_at: 0,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Returns whether the record is visible to ordinary reads.
    pub fn active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Marks the record as softly deleted.
    ///
    /// No-op when already deleted: the first tombstone timestamp is kept and
    /// the repeated request is logged instead of raised.
    pub fn delete(&mut self, kind: ResourceKind) {
        if let Some(at) = self.deleted_at {
            warn!(
                "event=record_delete module=model status=noop kind={} id={} already_deleted_at={at}",
                kind.as_str(),
                self.id
            );
            return;
        }
        self.deleted_at = Some(now_millis());
    }

    /// Clears the soft-delete tombstone.
    ///
    /// No-op when the record is already active; logged, never escalated.
    pub fn undelete(&mut self, kind: ResourceKind) {
        if self.deleted_at.is_none() {
            warn!(
                "event=record_undelete module=model status=noop kind={} id={} deleted_at=absent",
                kind.as_str(),
                self.id
            );
            return;
        }
        self.deleted_at = None;
    }
}

/// Contract implemented by every resource the lifecycle engine manages.
pub trait ManagedRecord {
    /// Resource kind used for capability lookup and user-facing messages.
    const KIND: ResourceKind;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Instantiates an unsaved record.
    ///
    /// The dispatcher supplies `owner` for ownable kinds; non-ownable kinds
    /// ignore it.
    fn blank(owner: Option<crate::model::principal::UserId>) -> Self;

    /// Owning principal reference. `None` for kinds without an owner.
    fn owner(&self) -> Option<crate::model::principal::UserId> {
        None
    }

    fn id(&self) -> RecordId {
        self.meta().id
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{now_millis, RecordMeta, IMMUTABLE_ATTRS};
    use crate::access::capability::ResourceKind;

    #[test]
    fn unsaved_meta_is_active() {
        let meta = RecordMeta::unsaved();
        assert!(meta.active());
        assert_eq!(meta.id, 0);
        assert_eq!(meta.updated_at, None);
    }

    #[test]
    fn delete_stamps_once_and_second_call_is_noop() {
        let mut meta = RecordMeta::unsaved();
        meta.delete(ResourceKind::Tag);
        let first = meta.deleted_at.expect("tombstone should be set");
        meta.delete(ResourceKind::Tag);
        assert_eq!(meta.deleted_at, Some(first));
        assert!(!meta.active());
    }

    #[test]
    fn undelete_on_active_record_is_noop() {
        let mut meta = RecordMeta::unsaved();
        meta.undelete(ResourceKind::Tag);
        assert_eq!(meta.deleted_at, None);
        assert!(meta.active());
    }

    #[test]
    fn delete_then_undelete_round_trips() {
        let mut meta = RecordMeta::unsaved();
        meta.delete(ResourceKind::Entry);
        assert!(!meta.active());
        meta.undelete(ResourceKind::Entry);
        assert!(meta.active());
    }

    #[test]
    fn immutable_attrs_cover_all_metadata_fields() {
        for attr in ["id", "created_at", "updated_at", "deleted_at"] {
            assert!(IMMUTABLE_ATTRS.contains(&attr));
        }
    }

    #[test]
    fn now_millis_is_positive() {
        assert!(now_millis() > 0);
    }
}
