//! Repository contracts shared by all managed resource stores.
//!
//! # Responsibility
//! - Define the store seam the dispatcher drives (`RecordStore`).
//! - Define the repository error and pagination envelopes.
//!
//! # Invariants
//! - Every read path takes a resolved `AccessScope`; repositories never
//!   consult ambient principal state.
//! - Writes are single statements or one immediate transaction, so timestamp
//!   stamping is atomic with the field change.

use crate::access::capability::ResourceKind;
use crate::access::scope::AccessScope;
use crate::db::DbError;
use crate::model::principal::UserId;
use crate::model::record::{ManagedRecord, RecordId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entry_repo;
pub mod role_repo;
pub mod tag_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: ResourceKind, id: RecordId },
    /// A share list names a user row that does not exist.
    UnknownShareTarget { id: UserId },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::UnknownShareTarget { id } => write!(f, "unknown share target user: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::UnknownShareTarget { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Default collection page size.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Pagination request for collection reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number; `0` normalizes to the first page.
    pub page: u32,
    /// Rows per page; `0` normalizes to the default.
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn normalized(&self) -> (u32, u32) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = if self.per_page == 0 {
            DEFAULT_PER_PAGE
        } else {
            self.per_page
        };
        (page, per_page)
    }

    /// Widened so extreme page numbers cannot overflow the multiply.
    pub fn offset(&self) -> u64 {
        let (page, per_page) = self.normalized();
        u64::from(page - 1) * u64::from(per_page)
    }
}

/// One page of a collection read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    /// Total row count under the same scope, across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Number of pages under the current page size.
    pub fn pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page)) as u32
    }
}

/// Collection ordering request.
///
/// Unknown field names leave the collection unordered rather than failing;
/// callers pass user-supplied column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrder {
    pub field: String,
    pub descending: bool,
}

impl Default for ListOrder {
    fn default() -> Self {
        Self {
            field: "created_at".to_string(),
            descending: false,
        }
    }
}

impl ListOrder {
    pub fn by(field: impl Into<String>, descending: bool) -> Self {
        Self {
            field: field.into(),
            descending,
        }
    }
}

/// Store seam driven by the CRUD action dispatcher.
///
/// `find_by_id` and `list` apply the resolved scope (ownership predicate and
/// soft-delete visibility); `reload` re-reads a record already authorized by
/// a prior scoped fetch and must not be used as an access path.
pub trait RecordStore {
    type Record: ManagedRecord;

    fn find_by_id(&self, scope: &AccessScope, id: RecordId) -> RepoResult<Option<Self::Record>>;

    fn list(
        &self,
        scope: &AccessScope,
        order: &ListOrder,
        page: &PageRequest,
    ) -> RepoResult<Page<Self::Record>>;

    /// Persists a new record and returns its storage-assigned id.
    fn insert(&self, record: &Self::Record) -> RepoResult<RecordId>;

    /// Persists mutable domain fields and stamps `updated_at` atomically.
    fn update(&self, record: &Self::Record) -> RepoResult<()>;

    /// Persists the record's lifecycle state (`deleted_at`) as mutated by
    /// `RecordMeta::delete`/`undelete`.
    fn persist_lifecycle(&self, record: &Self::Record) -> RepoResult<()>;

    /// Re-reads a record by id, bypassing the ownership predicate.
    fn reload(&self, id: RecordId, include_deleted: bool) -> RepoResult<Self::Record>;
}

pub(crate) fn ensure_scope_kind(scope: &AccessScope, expected: ResourceKind) -> RepoResult<()> {
    if scope.kind != expected {
        return Err(RepoError::InvalidData(format!(
            "scope resolved for {} used on a {} store",
            scope.kind.as_str(),
            expected.as_str()
        )));
    }
    Ok(())
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{ListOrder, Page, PageRequest, DEFAULT_PER_PAGE};

    #[test]
    fn zero_page_request_normalizes_to_defaults() {
        let request = PageRequest {
            page: 0,
            per_page: 0,
        };
        assert_eq!(request.normalized(), (1, DEFAULT_PER_PAGE));
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let request = PageRequest {
            page: 3,
            per_page: 10,
        };
        assert_eq!(request.offset(), 20);
    }

    #[test]
    fn offset_survives_extreme_page_numbers() {
        let request = PageRequest {
            page: u32::MAX,
            per_page: 10,
        };
        assert_eq!(request.offset(), u64::from(u32::MAX - 1) * 10);
    }

    #[test]
    fn page_count_rounds_up() {
        let page: Page<()> = Page {
            items: Vec::new(),
            page: 1,
            per_page: 10,
            total: 21,
        };
        assert_eq!(page.pages(), 3);
    }

    #[test]
    fn default_order_is_created_at_ascending() {
        let order = ListOrder::default();
        assert_eq!(order.field, "created_at");
        assert!(!order.descending);
    }
}
