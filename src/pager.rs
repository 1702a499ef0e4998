//! Paginated queries.

use chrono::Local;
use serde::de::DeserializeOwned;

use crate::pagination::{has_more, PageCursor, Paged};
use crate::pipeline::{Endpoint, PageRequest, Pipeline};
use crate::query::Query;

/// A [`Query`] over consecutive pages of one endpoint.
///
/// Moving to another page supersedes the load in flight. Whether a next page
/// exists is judged from the length of the current page, so there is none
/// while it is loading or after it failed.
pub struct Pager<T> {
  endpoint: Endpoint,
  cursor: PageCursor,
  query: Query<T>,
  last_len: Option<usize>,
}

impl<T: DeserializeOwned + Paged + Send + 'static> Pager<T> {
  pub fn new(endpoint: Endpoint, limit: u32) -> Self {
    Self {
      endpoint,
      cursor: PageCursor::first(limit),
      query: Query::new(),
      last_len: None,
    }
  }

  /// Load the current page.
  pub fn load(&mut self, pipeline: &Pipeline) {
    let request = PageRequest::new(self.endpoint.clone(), self.cursor);
    self.query.load(pipeline, request);
    self.record_len();
  }

  /// Pick up a finished load. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let changed = self.query.poll();
    if changed {
      self.record_len();
    }
    changed
  }

  /// Advance one page. Does nothing once a short page has been seen.
  pub fn next_page(&mut self, pipeline: &Pipeline) -> bool {
    if !self.has_next() {
      return false;
    }
    self.cursor = self.cursor.next();
    self.last_len = None;
    self.load(pipeline);
    true
  }

  /// Go back one page. Does nothing on page 1.
  pub fn prev_page(&mut self, pipeline: &Pipeline) -> bool {
    match self.cursor.prev() {
      Some(prev) => {
        self.cursor = prev;
        self.last_len = None;
        self.load(pipeline);
        true
      }
      None => false,
    }
  }

  pub fn retry(&mut self, pipeline: &Pipeline) {
    self.query.retry(pipeline);
    self.record_len();
  }

  pub fn refetch(&mut self, pipeline: &Pipeline) {
    self.query.refetch(pipeline);
  }

  fn record_len(&mut self) {
    if let Some(data) = self.query.data() {
      self.last_len = Some(data.page_len());
    }
  }
}

impl<T> Pager<T> {
  pub fn query(&self) -> &Query<T> {
    &self.query
  }

  pub fn cursor(&self) -> PageCursor {
    self.cursor
  }

  pub fn has_next(&self) -> bool {
    self
      .last_len
      .is_some_and(|len| has_more(len, self.cursor.limit()))
  }

  pub fn has_prev(&self) -> bool {
    self.cursor.page() > 1
  }

  /// "Page N" plus the directions that are available.
  pub fn label(&self) -> String {
    let mut label = format!("Page {}", self.cursor.page());
    if self.has_prev() {
      label.push_str(" | p: prev");
    }
    if self.has_next() {
      label.push_str(" | n: next");
    }
    if let Some(at) = self.query.cached_at() {
      label.push_str(&format!(" | cached {}", at.with_timezone(&Local).format("%H:%M:%S")));
    }
    label
  }
}
