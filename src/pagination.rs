//! Page cursors and end-of-data detection.
//!
//! The backend never reports a total item count, so the last page is inferred
//! from a short page: fewer items than the page size means there is nothing
//! after it. A final page holding exactly `limit` items still reports more.

/// A 1-based page number plus a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCursor {
  page: u32,
  limit: u32,
}

impl PageCursor {
  /// Cursor at `page` with `limit` items per page. Both are clamped to at least 1.
  pub fn new(page: u32, limit: u32) -> Self {
    Self {
      page: page.max(1),
      limit: limit.max(1),
    }
  }

  /// First page with the given page size.
  pub fn first(limit: u32) -> Self {
    Self::new(1, limit)
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn limit(&self) -> u32 {
    self.limit
  }

  pub fn next(&self) -> Self {
    Self::new(self.page.saturating_add(1), self.limit)
  }

  /// Previous page, or `None` on page 1.
  pub fn prev(&self) -> Option<Self> {
    (self.page > 1).then(|| Self::new(self.page - 1, self.limit))
  }

  /// 1-based position of the first item on this page across all pages.
  pub fn first_item_number(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit) + 1
  }
}

/// Whether a page with `page_len` items may be followed by another page.
pub fn has_more(page_len: usize, limit: u32) -> bool {
  page_len >= limit as usize
}

/// Response bodies that carry one page of a longer list.
pub trait Paged {
  /// Number of list items on this page.
  fn page_len(&self) -> usize;
}
