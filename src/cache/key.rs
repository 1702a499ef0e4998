//! Cache keys for (endpoint, page) pairs.

use std::fmt;
use std::sync::Arc;

use crate::pipeline::Endpoint;

/// Key under which one page of one endpoint is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Function mapping an endpoint and page number to a cache key.
///
/// Must be deterministic: the same inputs always produce the same key.
pub type KeyFn = Arc<dyn Fn(&Endpoint, u32) -> CacheKey + Send + Sync>;

/// Default key scheme: `/clusters/3` page 2 becomes `clusters-3-page-2`.
pub fn default_key(endpoint: &Endpoint, page: u32) -> CacheKey {
  let resource = endpoint
    .path()
    .trim_matches('/')
    .split('/')
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join("-");

  CacheKey(format!("{}-page-{}", resource, page))
}
