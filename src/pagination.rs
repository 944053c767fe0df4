//! Page/limit handling shared by list endpoints.

use serde::Serialize;

/// A validated page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Page 0 or missing becomes 1. A missing or zero limit takes the default;
    /// anything else is clamped to `1..=max_limit`.
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let max_limit = max_limit.max(1);
        let limit = match limit {
            Some(0) | None => default_limit,
            Some(l) => l,
        };

        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            limit: limit.clamp(1, max_limit),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(request.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None, 10, 100);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(PageRequest::new(Some(1), Some(500), 10, 100).limit, 100);
        assert_eq!(PageRequest::new(Some(1), Some(0), 10, 100).limit, 10);
        assert_eq!(PageRequest::new(Some(0), Some(5), 10, 100).page, 1);
    }

    #[test]
    fn test_third_page_of_twenty_five() {
        let req = PageRequest::new(Some(3), Some(10), 10, 100);
        assert_eq!(req.offset(), 20);

        let pagination = Pagination::new(req, 25);
        assert_eq!(pagination.total_pages, 3);
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let pagination = Pagination::new(PageRequest::new(None, None, 10, 100), 0);
        assert_eq!(pagination.total_pages, 0);
    }
}
