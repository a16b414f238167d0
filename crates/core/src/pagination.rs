//! Pagination metadata.
//!
//! Listings return every matching row; page and limit are echoed back so
//! clients can slice on their side.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Requested page, validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build from optional query parameters, applying defaults.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> crate::Result<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err(crate::Error::InvalidPagination(
                "page must be at least 1".to_string(),
            ));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(crate::Error::InvalidPagination(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata attached to list responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl PaginationMetadata {
    pub fn new(total: usize, request: PageRequest) -> Self {
        Self {
            total: total as u64,
            page: request.page,
            limit: request.limit,
        }
    }
}
