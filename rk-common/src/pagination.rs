//! Client-side pagination for list views (import history, scan results)

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first row on this page
    pub offset: usize,
    /// Rows per page
    pub page_size: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages]. A zero page size
/// is treated as one row per page.
///
/// # Examples
/// ```
/// use rk_common::pagination::calculate_pagination;
///
/// // 45 total results at 20 per page = 3 pages (20 + 20 + 5)
/// let p = calculate_pagination(45, 2, 20);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 20);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(45, 99, 20);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 40);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
        page_size,
    }
}

/// Slice one page out of `items`
pub fn paginate<T>(items: &[T], requested_page: usize, page_size: usize) -> (&[T], Pagination) {
    let pagination = calculate_pagination(items.len(), requested_page, page_size);
    let end = (pagination.offset + pagination.page_size).min(items.len());
    let start = pagination.offset.min(end);
    (&items[start..end], pagination)
}
