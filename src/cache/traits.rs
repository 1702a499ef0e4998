//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde_json::Value;

use super::key::CacheKey;

/// A stored response body.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
  /// The decoded body, opaque to the cache
  pub data: Value,
  /// When the body was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Entries are written whole and only ever overwritten, never merged.
pub trait CacheStorage: Send + Sync {
  /// Get the entry stored under `key`, if any.
  fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

  /// Store `data` under `key`, replacing any previous entry.
  fn put(&self, key: &CacheKey, data: &Value) -> Result<()>;

  /// Remove every entry. Returns how many were removed.
  fn clear(&self) -> Result<usize>;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the backend
  Network,
  /// Served from the local store
  Cache,
}
