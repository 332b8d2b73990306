use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A page index clamped against a collection size.
///
/// Invariant: `1 <= page <= total_pages()`, and `total_pages()` is at least 1
/// even for an empty collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
}

impl PaginationState {
    /// Clamp `requested` into the valid page range. A zero page size is
    /// treated as one.
    pub fn clamp(total_count: usize, page_size: usize, requested: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_count, page_size);
        Self {
            page: requested.clamp(1, total_pages),
            page_size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total_count, self.page_size)
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) * self.page_size).min(self.total_count)
    }

    /// Half-open slice bounds into the sorted, filtered collection.
    pub fn bounds(&self) -> Range<usize> {
        let start = self.offset();
        start..(start + self.page_size).min(self.total_count)
    }

    /// Rows on this page: `min(page_size, total_count - offset)`.
    pub fn len(&self) -> usize {
        self.bounds().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// `ceil(total_count / page_size)`, never less than 1.
pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}
