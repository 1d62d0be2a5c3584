//! Wire types for the AyniLine REST API and the client that speaks it.
//!
//! Backend payloads are snake_case JSON with numeric ids. The `admin` crate
//! maps them into its own view models; the `mock-api` crate serves them.

pub mod api_client;
pub mod requests;
pub mod responses;
pub mod retry;
pub mod storage;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use api_client::{APIClient, APIErrorDetails, ClientError};
pub use retry::{Backoff, RetryClass, RetryPolicy, Retryable};
pub use storage::{FileStorage, MemoryStorage, Storage};

macro_rules! numeric_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug,
                Clone,
                Copy,
                PartialEq,
                Eq,
                PartialOrd,
                Ord,
                Hash,
                Display,
                Serialize,
                Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl std::str::FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim().parse().map($name)
                }
            }
        )*
    };
}

numeric_id!(
    /// A línea de vida (lifeline record).
    RecordId,
    UserId,
    AccidentId,
    PurchaseOrderId,
    MovementId,
    AuthorizationCodeId,
    AlertId,
    MaintenanceId,
);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize,
)]
pub enum SortOrder {
    #[display("ASC")]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[display("DESC")]
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Query parameters shared by every paginated listing endpoint.
///
/// Module specific filters (e.g. `estado`, `action`) go in `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub params: BTreeMap<String, String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: None,
            sort_order: None,
            search: None,
            params: BTreeMap::new(),
        }
    }
}

impl ListQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Query string pairs in the order the backend documents them.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy".to_string(), sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder".to_string(), order.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        for (key, value) in &self.params {
            pairs.push((key.clone(), value.clone()));
        }
        pairs
    }
}

/// Pagination metadata. Accepts both camelCase and snake_case totals since
/// modules disagree on the spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages", alias = "total_pages")]
    pub total_pages: u32,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            total: 0,
            total_pages: 0,
        }
    }
}

impl PageMeta {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// A page of results in either the `{data, meta}` or the
/// `{data, pagination}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(alias = "pagination")]
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
