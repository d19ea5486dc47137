//! FILENAME: core/engine/src/pagination.rs
//! PURPOSE: Pagination Controller - page counts, clamping and the visible window.

use serde::Serialize;
use std::ops::Range;

use crate::schema::PaginationConfig;

/// Snapshot of the pager for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub enabled: bool,
    pub page: usize,
    pub total_pages: usize,
    pub rows_per_page: usize,
    pub total_rows: usize,
    /// Index of the first visible row.
    pub start: usize,
    /// One past the last visible row.
    pub end: usize,
}

impl PageInfo {
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// `ceil(rows / size)` when enabled, 1 when disabled. An enabled pager over
/// zero rows has zero pages.
pub fn total_pages(config: &PaginationConfig, row_count: usize) -> usize {
    if !config.enabled {
        return 1;
    }
    (row_count + config.page_size() - 1) / config.page_size()
}

pub fn last_page(config: &PaginationConfig, row_count: usize) -> usize {
    total_pages(config, row_count).saturating_sub(1)
}

pub fn clamp_page(config: &PaginationConfig, row_count: usize, page: usize) -> usize {
    page.min(last_page(config, row_count))
}

/// Page holding the row at `index`.
pub fn page_of(config: &PaginationConfig, index: usize) -> usize {
    if config.enabled {
        index / config.page_size()
    } else {
        0
    }
}

/// Row indices shown on `page`. Everything when pagination is off.
pub fn visible_range(config: &PaginationConfig, row_count: usize, page: usize) -> Range<usize> {
    if !config.enabled {
        return 0..row_count;
    }
    let size = config.page_size();
    let start = page.saturating_mul(size).min(row_count);
    let end = start.saturating_add(size).min(row_count);
    start..end
}

pub fn page_info(config: &PaginationConfig, row_count: usize, page: usize) -> PageInfo {
    let range = visible_range(config, row_count, page);
    PageInfo {
        enabled: config.enabled,
        page,
        total_pages: total_pages(config, row_count),
        rows_per_page: if config.enabled { config.page_size() } else { row_count },
        total_rows: row_count,
        start: range.start,
        end: range.end,
    }
}
