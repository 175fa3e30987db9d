//! Page arithmetic for list views. Out-of-range requests are clamped instead
//! of rejected, so a stale `?page=` link still lands on a real page.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Items per page on every list view.
pub const PAGINATE_BY: u64 = 5;

/// The `page` query parameter, kept as a raw string so that garbage input
/// degrades to the first page instead of a rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, or `last`
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

impl PageRequest {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return PageRequest::Number(1);
        };
        if raw == "last" {
            return PageRequest::Last;
        }
        match raw.parse::<i64>() {
            Ok(number) if number >= 1 => PageRequest::Number(number as u64),
            _ => PageRequest::Number(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

/// Splits `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Always at least one page, even when there is nothing to show.
    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Resolves a request to a page number in `1..=num_pages`.
    pub fn page_number(&self, request: PageRequest) -> u64 {
        match request {
            PageRequest::Number(number) => number.clamp(1, self.num_pages()),
            PageRequest::Last => self.num_pages(),
        }
    }

    pub fn page_info(&self, number: u64) -> PageInfo {
        let num_pages = self.num_pages();
        PageInfo {
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// Paginator state for one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageInfo {
    /// Current page (1-based)
    pub number: u64,
    pub num_pages: u64,
    /// Items across all pages
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_request() {
        assert_eq!(PageRequest::parse(None), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("3")), PageRequest::Number(3));
        assert_eq!(PageRequest::parse(Some(" 2 ")), PageRequest::Number(2));
        assert_eq!(PageRequest::parse(Some("last")), PageRequest::Last);
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("0")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("-4")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("")), PageRequest::Number(1));
    }

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, PAGINATE_BY).num_pages(), 1);
        assert_eq!(Paginator::new(5, PAGINATE_BY).num_pages(), 1);
        assert_eq!(Paginator::new(6, PAGINATE_BY).num_pages(), 2);
        assert_eq!(Paginator::new(24, PAGINATE_BY).num_pages(), 5);
    }

    #[test]
    fn test_page_number_is_clamped() {
        let paginator = Paginator::new(24, PAGINATE_BY);
        assert_eq!(paginator.page_number(PageRequest::Number(1)), 1);
        assert_eq!(paginator.page_number(PageRequest::Number(5)), 5);
        assert_eq!(paginator.page_number(PageRequest::Number(99)), 5);
        assert_eq!(paginator.page_number(PageRequest::Last), 5);
    }

    #[test]
    fn test_page_info() {
        let paginator = Paginator::new(24, PAGINATE_BY);

        let first = paginator.page_info(1);
        assert!(first.is_paginated());
        assert!(first.has_next);
        assert!(!first.has_previous);

        let last = paginator.page_info(5);
        assert!(!last.has_next);
        assert!(last.has_previous);
        assert_eq!(last.count, 24);
    }

    #[test]
    fn test_single_page_is_not_paginated() {
        let info = Paginator::new(3, PAGINATE_BY).page_info(1);
        assert!(!info.is_paginated());
        assert!(!info.has_next);
        assert!(!info.has_previous);
    }

    #[test]
    fn test_page_query_request() {
        let query = PageQuery { page: Some("last".to_string()) };
        assert_eq!(query.request(), PageRequest::Last);
        assert_eq!(PageQuery::default().request(), PageRequest::Number(1));
    }
}
