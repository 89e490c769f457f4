//! Page-by-page collection for list endpoints.

use std::future::Future;

use tracing::debug;

use crate::http_utils::ApiError;

/// Upper bound on pages fetched by one listing.
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

/// One page of results and whether the server reports another one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, has_next: bool) -> Self {
        Self { records, has_next }
    }

    pub fn last(records: Vec<T>) -> Self {
        Self::new(records, false)
    }
}

/// Fetch pages 1, 2, ... until a page reports no successor, keeping page order.
///
/// Stops with [`ApiError::PageLimitExceeded`] once `max_pages` pages have been
/// read and the server still reports more.
pub async fn collect_pages<T, F, Fut>(max_pages: u32, mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut records = Vec::new();
    let mut page_number = 1;

    loop {
        let page = fetch(page_number).await?;
        debug!(
            "Page {} returned {} records (more: {})",
            page_number,
            page.records.len(),
            page.has_next
        );
        records.extend(page.records);

        if !page.has_next {
            return Ok(records);
        }
        if page_number >= max_pages {
            return Err(ApiError::PageLimitExceeded(page_number));
        }
        page_number += 1;
    }
}
