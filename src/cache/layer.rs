//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use super::key::CacheKey;
use super::traits::{CacheEntry, CacheStorage};
use crate::error::FetchError;

type FetchFuture = BoxFuture<'static, Result<Value, FetchError>>;

/// Cache layer that manages caching logic and network fetching.
///
/// Reads go to storage first. On a miss the caller-supplied fetcher runs and
/// its successful result is written back exactly once. Concurrent misses for
/// the same key share one fetch.
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// Entries older than this count as absent. `None` keeps them forever.
  max_age: Option<Duration>,
  /// Fetches currently running, by key. Only weak handles are kept here so
  /// a fetch whose callers have all gone away is dropped.
  in_flight: Arc<Mutex<HashMap<CacheKey, WeakShared<FetchFuture>>>>,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self::from_shared(Arc::new(storage))
  }

  /// Create a cache layer over storage that is also used elsewhere.
  pub fn from_shared(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      max_age: None,
      in_flight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Expire entries older than `max_age`.
  pub fn with_max_age(mut self, max_age: Duration) -> Self {
    self.max_age = Some(max_age);
    self
  }

  /// Check if an entry cached at `cached_at` is past its max age.
  fn is_expired(&self, cached_at: DateTime<Utc>) -> bool {
    match self.max_age {
      Some(max_age) => Utc::now() - cached_at >= max_age,
      None => false,
    }
  }

  /// Look up a usable entry without touching the network.
  ///
  /// Storage errors are logged and treated as a miss.
  pub fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
    match self.storage.get(key) {
      Ok(Some(entry)) if self.is_expired(entry.cached_at) => {
        debug!(%key, cached_at = %entry.cached_at, "cache entry expired");
        None
      }
      Ok(entry) => entry,
      Err(e) => {
        warn!(%key, error = %e, "cache read failed, treating as miss");
        None
      }
    }
  }

  /// Run `fetcher` for `key` and store its result on success.
  ///
  /// If a fetch for `key` is already running, this waits on it instead of
  /// calling `fetcher`. Failures are never stored.
  pub async fn fetch<F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<Value, FetchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    let shared = self.join_or_start(key, fetcher);
    let result = shared.clone().await;
    self.finish(key, &shared);
    result
  }

  fn join_or_start<F, Fut>(&self, key: &CacheKey, fetcher: F) -> Shared<FetchFuture>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    let mut in_flight = self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner);

    if let Some(pending) = in_flight.get(key).and_then(WeakShared::upgrade) {
      debug!(%key, "joining in-flight request");
      return pending;
    }

    let storage = Arc::clone(&self.storage);
    let store_key = key.clone();
    let request = fetcher();
    let shared = async move {
      let data = request.await?;
      // Fetched data is still good even if the write fails
      if let Err(e) = storage.put(&store_key, &data) {
        warn!(key = %store_key, error = %e, "cache write failed");
      }
      Ok(data)
    }
    .boxed()
    .shared();

    if let Some(weak) = shared.downgrade() {
      in_flight.insert(key.clone(), weak);
    }
    shared
  }

  /// Drop the in-flight record for `key` if it still points at `finished`.
  fn finish(&self, key: &CacheKey, finished: &Shared<FetchFuture>) {
    let mut in_flight = self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner);

    let stale = match in_flight.get(key).and_then(WeakShared::upgrade) {
      Some(current) => current.ptr_eq(finished),
      None => true,
    };
    if stale {
      in_flight.remove(key);
    }
  }

  /// Remove every stored entry.
  pub fn clear(&self) -> color_eyre::Result<usize> {
    self.storage.clear()
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      max_age: self.max_age,
      in_flight: Arc::clone(&self.in_flight),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStorage;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::sync::Notify;

  fn layer() -> (CacheLayer, Arc<SqliteStorage>) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let layer = CacheLayer::from_shared(storage.clone());
    (layer, storage)
  }

  #[tokio::test]
  async fn test_success_is_stored() {
    let (layer, storage) = layer();
    let key = CacheKey::new("hotspots-page-1");

    let data = layer
      .fetch(&key, || async { Ok(json!({"total_logs": 120})) })
      .await
      .unwrap();

    assert_eq!(data, json!({"total_logs": 120}));
    assert_eq!(storage.get(&key).unwrap().unwrap().data, data);
    assert_eq!(layer.lookup(&key).unwrap().data, data);
  }

  #[tokio::test]
  async fn test_failure_is_not_stored() {
    let (layer, storage) = layer();
    let key = CacheKey::new("hotspots-page-1");

    let result = layer
      .fetch(&key, || async {
        Err(FetchError::HttpStatus {
          status: 500,
          url: "http://localhost:8000/hotspots".to_string(),
        })
      })
      .await;

    assert!(matches!(result, Err(FetchError::HttpStatus { status: 500, .. })));
    assert!(storage.get(&key).unwrap().is_none());
    assert!(layer.lookup(&key).is_none());
  }

  #[tokio::test]
  async fn test_zero_max_age_always_expires() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let layer = CacheLayer::from_shared(storage.clone()).with_max_age(Duration::zero());
    let key = CacheKey::new("hotspots-page-1");
    storage.put(&key, &json!({})).unwrap();

    assert!(layer.lookup(&key).is_none());
  }

  #[tokio::test]
  async fn test_long_max_age_keeps_entry() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let layer = CacheLayer::from_shared(storage.clone()).with_max_age(Duration::hours(1));
    let key = CacheKey::new("hotspots-page-1");
    storage.put(&key, &json!({})).unwrap();

    assert!(layer.lookup(&key).is_some());
  }

  #[tokio::test]
  async fn test_concurrent_fetches_share_one_request() {
    let (layer, _storage) = layer();
    let key = CacheKey::new("clusters-overview-page-1");
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());

    let fetcher = |calls: Arc<AtomicUsize>, gate: Arc<Notify>| {
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        gate.notified().await;
        Ok(json!({"total_clusters": 3}))
      }
    };

    let first = {
      let layer = layer.clone();
      let key = key.clone();
      let f = fetcher(calls.clone(), gate.clone());
      tokio::spawn(async move { layer.fetch(&key, f).await })
    };
    let second = {
      let layer = layer.clone();
      let key = key.clone();
      let f = fetcher(calls.clone(), gate.clone());
      tokio::spawn(async move { layer.fetch(&key, f).await })
    };

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    gate.notify_one();

    assert_eq!(first.await.unwrap().unwrap(), json!({"total_clusters": 3}));
    assert_eq!(second.await.unwrap().unwrap(), json!({"total_clusters": 3}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_abandoned_fetch_writes_nothing() {
    let (layer, storage) = layer();
    let key = CacheKey::new("test-anomalies-page-1");
    let gate = Arc::new(Notify::new());

    let task = {
      let layer = layer.clone();
      let key = key.clone();
      let gate = gate.clone();
      tokio::spawn(async move {
        layer
          .fetch(&key, move || async move {
            gate.notified().await;
            Ok(json!({"anomalies": []}))
          })
          .await
      })
    };

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    gate.notify_one();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(storage.get(&key).unwrap().is_none());

    // The abandoned fetch must not be joined by later callers
    let data = layer
      .fetch(&key, || async { Ok(json!({"anomalies": [1]})) })
      .await
      .unwrap();
    assert_eq!(data, json!({"anomalies": [1]}));
  }
}
