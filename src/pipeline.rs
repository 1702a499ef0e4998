//! The fetch-cache-paginate pipeline shared by every view.
//!
//! A view describes what it wants as a [`PageRequest`] and the pipeline
//! resolves it: a stored body is served without touching the network,
//! otherwise the backend is asked once and a successful body is stored.
//! Call-site state (loading, success, failure, cancellation) lives in
//! [`crate::query::Query`].

use color_eyre::Result;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{default_key, CacheKey, CacheLayer, CacheResult, CacheStorage, KeyFn};
use crate::error::FetchError;
use crate::pagination::PageCursor;

/// Path of a backend resource, relative to the backend base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
  pub fn new(path: impl Into<String>) -> Self {
    Self(path.into())
  }

  pub fn path(&self) -> &str {
    &self.0
  }
}

/// One page of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  pub endpoint: Endpoint,
  pub cursor: PageCursor,
}

impl PageRequest {
  pub fn new(endpoint: Endpoint, cursor: PageCursor) -> Self {
    Self { endpoint, cursor }
  }
}

/// Transport that turns a page request into a decoded JSON body.
///
/// Implementations report non-2xx statuses as [`FetchError::HttpStatus`].
pub trait Backend: Send + Sync {
  fn get(&self, request: &PageRequest) -> BoxFuture<'static, Result<Value, FetchError>>;
}

/// Resolves page requests through the cache and the backend.
#[derive(Clone)]
pub struct Pipeline {
  backend: Arc<dyn Backend>,
  cache: CacheLayer,
  key_fn: KeyFn,
}

impl Pipeline {
  pub fn new(backend: impl Backend + 'static, storage: impl CacheStorage + 'static) -> Self {
    Self::from_parts(Arc::new(backend), CacheLayer::new(storage))
  }

  pub fn from_parts(backend: Arc<dyn Backend>, cache: CacheLayer) -> Self {
    Self {
      backend,
      cache,
      key_fn: Arc::new(default_key),
    }
  }

  /// Use a custom cache key scheme.
  pub fn with_key_fn<F>(mut self, key_fn: F) -> Self
  where
    F: Fn(&Endpoint, u32) -> CacheKey + Send + Sync + 'static,
  {
    self.key_fn = Arc::new(key_fn);
    self
  }

  /// Cache key for a request.
  pub fn key(&self, request: &PageRequest) -> CacheKey {
    (self.key_fn)(&request.endpoint, request.cursor.page())
  }

  /// Return the stored body for `request`, decoded as `T`, without any I/O
  /// beyond the local store.
  ///
  /// An entry that no longer decodes as `T` counts as a miss.
  pub fn cached<T: DeserializeOwned>(&self, request: &PageRequest) -> Option<CacheResult<T>> {
    let key = self.key(request);
    let entry = self.cache.lookup(&key)?;
    match T::deserialize(&entry.data) {
      Ok(data) => {
        debug!(%key, "cache hit");
        Some(CacheResult::from_cache(data, entry.cached_at))
      }
      Err(e) => {
        warn!(%key, error = %e, "cached body no longer decodes, ignoring");
        None
      }
    }
  }

  /// Fetch `request` from the backend and store the body on success.
  ///
  /// The body is only stored if it decodes as `T`.
  pub async fn fetch<T>(&self, request: PageRequest) -> Result<T, FetchError>
  where
    T: DeserializeOwned + Send + 'static,
  {
    let key = self.key(&request);
    let backend = Arc::clone(&self.backend);

    let body = self
      .cache
      .fetch(&key, move || {
        info!(
          endpoint = request.endpoint.path(),
          page = request.cursor.page(),
          limit = request.cursor.limit(),
          "fetching from backend"
        );
        let response = backend.get(&request);
        async move {
          let body = response.await?;
          // Reject bodies of the wrong shape before they reach the store
          T::deserialize(&body)?;
          Ok(body)
        }
      })
      .await
      .inspect_err(|e| warn!(%key, error = %e, "load failed"))?;

    Ok(T::deserialize(&body)?)
  }

  /// Remove every stored body.
  pub fn clear_cache(&self) -> Result<usize> {
    self.cache.clear()
  }
}

#[cfg(test)]
pub(crate) mod testing {
  //! Counting fake backend for pipeline tests.

  use super::*;
  use futures::FutureExt;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use tokio::sync::Notify;

  /// Serves canned responses per endpoint path and counts requests.
  ///
  /// A response set for a specific page takes precedence over the one for
  /// the whole path.
  #[derive(Default)]
  pub struct FakeBackend {
    responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
    page_responses: Mutex<HashMap<(String, u32), Result<Value, FetchError>>>,
    page_gates: Mutex<HashMap<u32, Arc<Notify>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
  }

  impl FakeBackend {
    pub fn new() -> Self {
      Self::default()
    }

    /// Hold every response until the returned gate is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
      let gate = Arc::new(Notify::new());
      self.gate = Some(gate.clone());
      (self, gate)
    }

    pub fn respond(&self, path: &str, response: Result<Value, FetchError>) {
      self
        .responses
        .lock()
        .unwrap()
        .insert(path.to_string(), response);
    }

    pub fn respond_page(&self, path: &str, page: u32, response: Result<Value, FetchError>) {
      self
        .page_responses
        .lock()
        .unwrap()
        .insert((path.to_string(), page), response);
    }

    /// Hold responses for `page` only, until the returned gate is notified.
    pub fn gate_page(&self, page: u32) -> Arc<Notify> {
      let gate = Arc::new(Notify::new());
      self.page_gates.lock().unwrap().insert(page, gate.clone());
      gate
    }

    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  impl Backend for Arc<FakeBackend> {
    fn get(&self, request: &PageRequest) -> BoxFuture<'static, Result<Value, FetchError>> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      let path = request.endpoint.path().to_string();
      let page = request.cursor.page();
      let response = self
        .page_responses
        .lock()
        .unwrap()
        .get(&(path.clone(), page))
        .cloned()
        .or_else(|| self.responses.lock().unwrap().get(&path).cloned())
        .unwrap_or_else(|| {
          Err(FetchError::HttpStatus {
            status: 404,
            url: request.endpoint.path().to_string(),
          })
        });
      let gate = self.gate.clone();
      let page_gate = self.page_gates.lock().unwrap().get(&page).cloned();
      async move {
        if let Some(gate) = gate {
          gate.notified().await;
        }
        if let Some(gate) = page_gate {
          gate.notified().await;
        }
        response
      }
      .boxed()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testing::FakeBackend;
  use super::*;
  use crate::cache::SqliteStorage;
  use serde_json::json;

  fn pipeline(backend: &Arc<FakeBackend>) -> (Pipeline, Arc<SqliteStorage>) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let pipeline = Pipeline::from_parts(
      Arc::new(backend.clone()),
      CacheLayer::from_shared(storage.clone()),
    );
    (pipeline, storage)
  }

  fn hotspots(page: u32) -> PageRequest {
    PageRequest::new(Endpoint::new("/hotspots"), PageCursor::new(page, 50))
  }

  #[tokio::test]
  async fn test_fetch_populates_default_key() {
    let backend = Arc::new(FakeBackend::new());
    backend.respond("/hotspots", Ok(json!({"total_logs": 120})));
    let (pipeline, storage) = pipeline(&backend);

    let body: Value = pipeline.fetch(hotspots(1)).await.unwrap();

    assert_eq!(body, json!({"total_logs": 120}));
    let stored = storage.get(&CacheKey::new("hotspots-page-1")).unwrap();
    assert_eq!(stored.unwrap().data, body);
  }

  #[tokio::test]
  async fn test_cached_after_fetch_needs_no_backend() {
    let backend = Arc::new(FakeBackend::new());
    backend.respond("/hotspots", Ok(json!({"total_logs": 120})));
    let (pipeline, _storage) = pipeline(&backend);

    assert!(pipeline.cached::<Value>(&hotspots(1)).is_none());
    let _: Value = pipeline.fetch(hotspots(1)).await.unwrap();

    let hit = pipeline.cached::<Value>(&hotspots(1)).unwrap();
    assert_eq!(hit.data, json!({"total_logs": 120}));
    assert_eq!(backend.calls(), 1);
    // Other pages are separate entries
    assert!(pipeline.cached::<Value>(&hotspots(2)).is_none());
  }

  #[tokio::test]
  async fn test_wrong_shape_is_decode_error_and_not_stored() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Expected {
      total_logs: u64,
    }

    let backend = Arc::new(FakeBackend::new());
    backend.respond("/hotspots", Ok(json!({"total_logs": "many"})));
    let (pipeline, storage) = pipeline(&backend);

    let result = pipeline.fetch::<Expected>(hotspots(1)).await;

    assert!(matches!(result, Err(FetchError::Decode(_))));
    assert!(storage.get(&CacheKey::new("hotspots-page-1")).unwrap().is_none());
  }

  #[tokio::test]
  async fn test_custom_key_fn() {
    let backend = Arc::new(FakeBackend::new());
    backend.respond("/hotspots", Ok(json!({})));
    let (pipeline, storage) = pipeline(&backend);
    let pipeline = pipeline.with_key_fn(|_, page| CacheKey::new(format!("hotspotsData-{page}")));

    let _: Value = pipeline.fetch(hotspots(3)).await.unwrap();

    assert!(storage.get(&CacheKey::new("hotspotsData-3")).unwrap().is_some());
  }

  #[tokio::test]
  async fn test_expired_entry_is_fetched_again() {
    let backend = Arc::new(FakeBackend::new());
    backend.respond("/hotspots", Ok(json!({})));
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let pipeline = Pipeline::from_parts(
      Arc::new(backend.clone()),
      CacheLayer::from_shared(storage).with_max_age(chrono::Duration::zero()),
    );

    let _: Value = pipeline.fetch(hotspots(1)).await.unwrap();
    assert!(pipeline.cached::<Value>(&hotspots(1)).is_none());
    let _: Value = pipeline.fetch(hotspots(1)).await.unwrap();
    assert_eq!(backend.calls(), 2);
  }

  #[tokio::test]
  async fn test_clear_cache_forces_refetch() {
    let backend = Arc::new(FakeBackend::new());
    backend.respond("/hotspots", Ok(json!({})));
    let (pipeline, _storage) = pipeline(&backend);

    let _: Value = pipeline.fetch(hotspots(1)).await.unwrap();
    assert_eq!(pipeline.clear_cache().unwrap(), 1);
    assert!(pipeline.cached::<Value>(&hotspots(1)).is_none());
  }
}
