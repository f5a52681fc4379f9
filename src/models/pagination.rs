use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// PageRequest
///
/// A validated `page`/`limit` pair. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values, applying defaults and rejecting
    /// out-of-range input.
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// Rows to skip. Saturates for pages far past any real listing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Whether this request starts at or beyond the last of `records` rows.
    pub fn is_past_end(&self, records: i64) -> bool {
        self.offset() >= records
    }
}

/// Pagination
///
/// Page metadata returned alongside every paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Pagination {
    pub current: i64,
    pub limit: i64,
    /// Total matching rows across all pages.
    pub records: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, records: i64) -> Self {
        let pages = if records <= 0 {
            0
        } else {
            (records + request.limit - 1) / request.limit
        };
        Self {
            current: request.page,
            limit: request.limit,
            records: records.max(0),
            pages,
        }
    }
}

/// Page
///
/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Page<T> {
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, records: i64, request: PageRequest) -> Self {
        Self {
            pagination: Pagination::new(request, records),
            data,
        }
    }

    /// Slices an already filtered and ordered collection.
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let records = all.len() as i64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let data = all
            .into_iter()
            .skip(skip)
            .take(request.limit as usize)
            .collect();
        Self::new(data, records, request)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            pagination: self.pagination,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_saturates_for_huge_pages() {
        let request = PageRequest::from_query(Some(i64::MAX), Some(MAX_PAGE_LIMIT)).unwrap();
        assert_eq!(request.offset(), i64::MAX);
        assert!(request.is_past_end(1_000));
    }

    #[test]
    fn test_from_all_past_the_end_keeps_pagination() {
        let request = PageRequest::from_query(Some(i64::MAX), Some(2)).unwrap();
        let page = Page::from_all(vec![1, 2, 3], request);
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.records, 3);
        assert_eq!(page.pagination.pages, 2);
        assert_eq!(page.pagination.current, i64::MAX);
    }

    #[test]
    fn test_from_all_slices_the_requested_page() {
        let request = PageRequest::from_query(Some(2), Some(2)).unwrap();
        let page = Page::from_all(vec![1, 2, 3], request);
        assert_eq!(page.data, vec![3]);
        assert!(!request.is_past_end(3));
    }
}
