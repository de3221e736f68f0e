//! Role domain model.
//!
//! Roles are system-wide records: no owner, admin-managed, seeded once at
//! bootstrap.

use crate::access::capability::ResourceKind;
use crate::model::principal::UserId;
use crate::model::record::{ManagedRecord, RecordMeta};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Non-ownable role record backing the authorization vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub meta: RecordMeta,
    pub name: String,
    pub description: Option<String>,
}

impl ManagedRecord for Role {
    const KIND: ResourceKind = ResourceKind::Role;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn blank(_owner: Option<UserId>) -> Self {
        Self {
            meta: RecordMeta::unsaved(),
            name: String::new(),
            description: None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Role: {}", self.name)
    }
}
