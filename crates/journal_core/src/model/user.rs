//! User domain model.
//!
//! Users are system-wide records (admin-managed); the authentication flow
//! that fills `password_hash` and `confirmed_at` lives outside this engine.

use crate::access::capability::ResourceKind;
use crate::model::principal::UserId;
use crate::model::record::{ManagedRecord, RecordMeta};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Non-ownable user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub meta: RecordMeta,
    pub email: String,
    /// Password hash slot, written by the external authentication flow.
    pub password_hash: String,
    /// Stable security token minted at creation.
    pub security_token: String,
    pub confirmed_at: Option<i64>,
}

impl ManagedRecord for User {
    const KIND: ResourceKind = ResourceKind::User;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn blank(_owner: Option<UserId>) -> Self {
        Self {
            meta: RecordMeta::unsaved(),
            email: String::new(),
            password_hash: String::new(),
            security_token: Uuid::new_v4().simple().to_string(),
            confirmed_at: None,
        }
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User: {}", self.email)
    }
}
