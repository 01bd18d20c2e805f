// ABOUTME: Page-number pagination for REST list endpoints
// ABOUTME: Produces count/next/previous/results envelopes with clamped page sizes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use serde::{Deserialize, Serialize};

/// Page-number pagination parameters parsed from a query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl PageParams {
    /// Build parameters from optional query values, clamping to sane bounds
    ///
    /// Page numbers below 1 become 1; page sizes are clamped to `1..=max_page_size`.
    #[must_use]
    pub fn new(
        page: Option<u32>,
        page_size: Option<u32>,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        let max = max_page_size.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_page_size).clamp(1, max),
        }
    }

    /// SQL `LIMIT` value
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// SQL `OFFSET` value
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Paginated response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of matching items across all pages
    pub count: i64,
    /// Link to the next page, if any
    pub next: Option<String>,
    /// Link to the previous page, if any
    pub previous: Option<String>,
    /// Items in this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page, computing navigation links with `link_for(page_number)`
    pub fn new<F>(results: Vec<T>, count: i64, params: PageParams, link_for: F) -> Self
    where
        F: Fn(u32) -> String,
    {
        let seen = params.offset() + results.len() as i64;
        let next = (seen < count).then(|| link_for(params.page + 1));
        let previous = (params.page > 1).then(|| link_for(params.page - 1));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_clamped() {
        let params = PageParams::new(Some(0), Some(500), 20, 100);
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 100);

        let defaults = PageParams::new(None, None, 20, 100);
        assert_eq!(defaults.page_size, 20);
        assert_eq!(defaults.offset(), 0);
    }

    #[test]
    fn test_links_on_middle_page() {
        let params = PageParams::new(Some(2), Some(10), 20, 100);
        let page = Page::new(vec![0; 10], 35, params, |p| format!("/items/?page={p}"));

        assert_eq!(page.next.as_deref(), Some("/items/?page=3"));
        assert_eq!(page.previous.as_deref(), Some("/items/?page=1"));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let params = PageParams::new(Some(4), Some(10), 20, 100);
        let page = Page::new(vec![0; 5], 35, params, |p| format!("?page={p}"));

        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("?page=3"));
    }
}
