use axum::http::header::{HeaderMap, HeaderValue};
use serde::Serialize;

/// Names of the request keys reserved for pagination
pub const PAGE_KEY: &str = "page";
pub const CURSOR_KEY: &str = "cursor";

/// What page of results the request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageRequest {
    /// 1-based page number
    Offset { page: u64, per_page: u64 },
    /// Opaque cursor handed out with a previous page
    Cursor { cursor: String, per_page: u64 },
}

impl PageRequest {
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        match self {
            Self::Offset { per_page, .. } | Self::Cursor { per_page, .. } => *per_page,
        }
    }

    /// Row offset for page-number pagination
    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        match self {
            Self::Offset { page, per_page } => Some(page.saturating_sub(1).saturating_mul(*per_page)),
            Self::Cursor { .. } => None,
        }
    }
}

/// Summary of an executed, paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub total: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(current_page: u64, per_page: u64, total: u64) -> Self {
        let last_page = if per_page == 0 {
            1
        } else {
            let pages = total.div_ceil(per_page);
            if pages == 0 { 1 } else { pages }
        };

        Self {
            per_page,
            current_page,
            last_page,
            total,
        }
    }

    /// Summary for an offset request once the total is known
    #[must_use]
    pub const fn for_request(request: &PageRequest, total: u64) -> Self {
        let page = match request {
            PageRequest::Offset { page, .. } => *page,
            PageRequest::Cursor { .. } => 1,
        };
        Self::new(page, request.per_page(), total)
    }
}

/// Pagination response headers.
///
/// Produces `Pagination-Count` (page size), `Pagination-Page` (current page),
/// `Pagination-Limit` (last page) and `Pagination-Total` (total records).
#[must_use]
pub fn pagination_headers(pagination: &Pagination) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in [
        ("pagination-count", pagination.per_page),
        ("pagination-page", pagination.current_page),
        ("pagination-limit", pagination.last_page),
        ("pagination-total", pagination.total),
    ] {
        headers.insert(name, HeaderValue::from(value));
    }

    headers
}
