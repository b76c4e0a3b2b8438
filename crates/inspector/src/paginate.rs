//! Paginated view over the request log

use crate::snapshot::RequestSnapshot;
use crate::store::RequestLog;
use serde::Serialize;
use std::sync::Arc;

/// Page requested when `page` is absent
pub const DEFAULT_PAGE: f64 = 1.0;

/// Page size used when `per_page` is absent
pub const DEFAULT_PER_PAGE: f64 = 10.0;

/// `page` / `per_page` as sent by the client
///
/// Values are kept as floats: `per_page=2.5` is accepted, and anything that
/// does not parse takes the default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageQuery {
    pub page: f64,
    pub per_page: f64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageQuery {
    /// Create a query
    pub fn new(page: f64, per_page: f64) -> Self {
        Self { page, per_page }
    }

    /// Read `page` and `per_page` from a raw query string
    ///
    /// A missing or unparsable key (including an empty value) takes its
    /// default. Numeric values are kept as sent, so `per_page=0` still
    /// yields an empty page.
    pub fn from_query(query: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> = query
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();

        let lookup = |name: &str, default: f64| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<f64>().ok())
                .unwrap_or(default)
        };

        Self {
            page: lookup("page", DEFAULT_PAGE),
            per_page: lookup("per_page", DEFAULT_PER_PAGE),
        }
    }
}

/// One page of the request log, as served by the inspection endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PaginationView {
    pub total: usize,
    pub total_page: i64,
    pub current_page: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page_url: String,
    pub prev_page_url: String,
    pub data: Vec<Arc<RequestSnapshot>>,
}

/// Compute the requested page of `log`
///
/// `path` is the endpoint path used to build the prev/next links. A
/// non-positive or non-finite `per_page` yields zero pages and no data.
pub fn paginate(log: &RequestLog, query: PageQuery, path: &str) -> PaginationView {
    let page = if query.page.is_finite() { query.page } else { 0.0 };
    let per_page = query.per_page;
    let usable = per_page.is_finite() && per_page > 0.0;

    let (total, data, total_page) = if usable {
        let offset = ((page - 1.0) * per_page).max(0.0) as usize;
        let (total, data) = log.page(offset, per_page as usize);
        let total_page = (total as f64 / per_page).ceil() as i64;
        (total, data, total_page)
    } else {
        (log.len(), Vec::new(), 0)
    };

    let current_page = page as i64;
    let per_page = if per_page.is_finite() { per_page as i64 } else { 0 };

    let has_prev = current_page > 1;
    let has_next = current_page < total_page;
    let link = |target: i64| format!("{}?page={}&per_page={}", path, target, per_page);

    PaginationView {
        total,
        total_page,
        current_page,
        per_page,
        has_next,
        has_prev,
        next_page_url: if has_next { link(current_page + 1) } else { String::new() },
        prev_page_url: if has_prev { link(current_page - 1) } else { String::new() },
        data,
    }
}
