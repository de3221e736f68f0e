//! Core domain logic for the journal record-keeping engine.
//! This crate is the single source of truth for business invariants.

pub mod access;
pub mod db;
pub mod dispatch;
pub mod forms;
pub mod logging;
pub mod model;
pub mod repo;

pub use access::capability::{capabilities, Capabilities, ResourceKind};
pub use access::scope::{resolve_scope, AccessError, AccessScope, ScopePredicate};
pub use dispatch::action::{submitted_action, FormAction};
pub use dispatch::{
    form_view, table_view, DispatchError, Flash, FormOutcome, MessageCategory, RenderMode,
    RequestContext,
};
pub use forms::base::{process_request_id, FormPayload, RecordForm, ValidationErrors};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::principal::{parse_role_name, Principal, RoleName, UserId};
pub use model::record::{ManagedRecord, RecordId, RecordMeta};
pub use repo::{ListOrder, Page, PageRequest, RecordStore, RepoError, RepoResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
