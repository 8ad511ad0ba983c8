//! Listing query descriptor.

use street_admin_core::OrderStatus;

use crate::error::AppError;

/// Default orders per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which orders to fetch: page, page size, status filter and search term.
///
/// Rebuilt on every filter change. Changing the search term or the status
/// filter always returns to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingQuery {
    page: u32,
    limit: u32,
    status: Option<OrderStatus>,
    search: Option<String>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListingQuery {
    /// First page, no filters.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            status: None,
            search: None,
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub const fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Apply a search term; blank terms clear the search.
    #[must_use]
    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self.page = 1;
        self
    }

    /// Apply a status filter; `None` shows every status.
    #[must_use]
    pub const fn with_status(mut self, status: Option<OrderStatus>) -> Self {
        self.status = status;
        self.page = 1;
        self
    }

    /// Move to `page`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for page 0.
    pub fn with_page(mut self, page: u32) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::BadRequest("Page must be at least 1.".to_string()));
        }
        self.page = page;
        Ok(self)
    }

    /// Query-string parameters; filters are only sent when set.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}
