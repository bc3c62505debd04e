//! Pagination types shared by the store, the index and the search engine

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not supply one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A page window plus an optional caller-requested sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: usize,
    /// Number of items per page
    pub size: usize,
    /// Sort directives such as `name,asc`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        PageRequest {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Same window, no sort
    pub fn without_sort(&self) -> Self {
        PageRequest::of(self.page, self.size)
    }

    /// `(limit, offset)` as SQL integers
    ///
    /// `None` when the window starts beyond what SQLite can address; such a
    /// page can only be empty.
    pub fn sql_window(&self) -> Option<(i64, i64)> {
        let offset = self.page.checked_mul(self.size)?;
        Some((i64::try_from(self.size).ok()?, i64::try_from(offset).ok()?))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::of(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results together with the total hit count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total: u64) -> Self {
        Page {
            content,
            total,
            request,
        }
    }

    /// Number of pages needed to hold `total` items
    pub fn total_pages(&self) -> u64 {
        if self.request.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.request.size as u64)
    }

    pub fn is_last(&self) -> bool {
        (self.request.page as u64).saturating_add(1) >= self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}
