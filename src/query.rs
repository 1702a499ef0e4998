//! Call-site request state for pipeline loads.
//!
//! A `Query<T>` owns the lifecycle of one UI element's data: it resolves
//! cache hits synchronously, runs misses on a background task, and picks the
//! result up on the next `poll()`. Starting a new load, cancelling, or
//! dropping the query aborts whatever was in flight, so a stale response can
//! neither change the state nor reach the cache.
//!
//! # Example
//!
//! ```ignore
//! let mut query: Query<HotspotsReport> = Query::new();
//! query.load(&pipeline, PageRequest::new(Resource::Hotspots.endpoint(), cursor));
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     RequestState::Loading => render_spinner(),
//!     RequestState::Success(data) => render_data(data),
//!     RequestState::Failed(e) => render_error(e),
//!     RequestState::Idle => {}
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::CacheSource;
use crate::error::FetchError;
use crate::pipeline::{PageRequest, Pipeline};

/// The state of a query
#[derive(Debug, Clone)]
pub enum RequestState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Failed(FetchError),
}

impl<T> RequestState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, RequestState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, RequestState::Success(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, RequestState::Failed(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      RequestState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&FetchError> {
    match self {
      RequestState::Failed(e) => Some(e),
      _ => None,
    }
  }
}

/// A spawned load. Dropping it aborts the task.
///
/// Abort takes effect at the task's next await point. A cache write that is
/// already running on another worker thread finishes after the drop returns,
/// but the dropped receiver keeps its result out of the query state.
struct Pending<T> {
  receiver: oneshot::Receiver<Result<T, FetchError>>,
  task: JoinHandle<()>,
}

impl<T> Drop for Pending<T> {
  fn drop(&mut self) {
    self.task.abort();
  }
}

/// Async query for one pipeline request at a time.
pub struct Query<T> {
  state: RequestState<T>,
  source: Option<CacheSource>,
  request: Option<PageRequest>,
  pending: Option<Pending<T>>,
  /// When the current data was stored, if it was served from the cache
  cached_at: Option<DateTime<Utc>>,
}

impl<T> Default for Query<T> {
  fn default() -> Self {
    Self {
      state: RequestState::Idle,
      source: None,
      request: None,
      pending: None,
      cached_at: None,
    }
  }
}

impl<T: DeserializeOwned + Send + 'static> Query<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Resolve `request`, superseding anything in flight.
  ///
  /// A cache hit becomes `Success` before this returns, with no task
  /// spawned. A miss moves to `Loading`; call `poll()` to pick up the result.
  pub fn load(&mut self, pipeline: &Pipeline, request: PageRequest) -> &RequestState<T> {
    self.pending = None;
    self.request = Some(request.clone());

    if let Some(hit) = pipeline.cached::<T>(&request) {
      self.state = RequestState::Success(hit.data);
      self.source = Some(hit.source);
      self.cached_at = hit.cached_at;
      return &self.state;
    }

    self.start_fetch(pipeline, request);
    &self.state
  }

  /// Load the current request again, skipping the cache.
  ///
  /// A successful response overwrites the stored entry.
  pub fn refetch(&mut self, pipeline: &Pipeline) {
    if let Some(request) = self.request.clone() {
      self.pending = None;
      self.start_fetch(pipeline, request);
    }
  }

  /// Load the current request again through the cache.
  ///
  /// After a failure nothing was stored, so this goes to the network.
  pub fn retry(&mut self, pipeline: &Pipeline) {
    if let Some(request) = self.request.clone() {
      self.load(pipeline, request);
    }
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let pending = match &mut self.pending {
      Some(pending) => pending,
      None => return false,
    };

    // Try to receive without blocking
    let result = match pending.receiver.try_recv() {
      Ok(result) => result,
      Err(oneshot::error::TryRecvError::Empty) => return false,
      Err(oneshot::error::TryRecvError::Closed) => {
        // Task ended without sending, e.g. it panicked
        Err(FetchError::Transport("request task ended without a result".to_string()))
      }
    };

    self.pending = None;
    match result {
      Ok(data) => {
        self.state = RequestState::Success(data);
        self.source = Some(CacheSource::Network);
        self.cached_at = None;
      }
      Err(error) => {
        self.state = RequestState::Failed(error);
        self.source = None;
        self.cached_at = None;
      }
    }
    true
  }

  fn start_fetch(&mut self, pipeline: &Pipeline, request: PageRequest) {
    let (tx, rx) = oneshot::channel();
    let pipeline = pipeline.clone();

    let task = tokio::spawn(async move {
      let result = pipeline.fetch::<T>(request).await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });

    self.pending = Some(Pending { receiver: rx, task });
    self.state = RequestState::Loading;
    self.source = None;
    self.cached_at = None;
  }
}

impl<T> Query<T> {
  /// Abandon the in-flight request, if any.
  ///
  /// The query goes back to `Idle`; the abandoned response is discarded and
  /// not stored unless its write had already started when this was called.
  pub fn cancel(&mut self) {
    if self.pending.take().is_some() {
      debug!("cancelled in-flight request");
      self.state = RequestState::Idle;
    }
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &RequestState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is currently loading.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query failed.
  pub fn is_failed(&self) -> bool {
    self.state.is_failed()
  }

  /// Get the error if the query failed.
  pub fn error(&self) -> Option<&FetchError> {
    self.state.error()
  }

  /// Where the current data came from.
  pub fn source(&self) -> Option<CacheSource> {
    self.source
  }

  /// The request most recently loaded.
  pub fn request(&self) -> Option<&PageRequest> {
    self.request.as_ref()
  }

  /// When the current data was stored, for cache hits.
  pub fn cached_at(&self) -> Option<DateTime<Utc>> {
    self.cached_at
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("request", &self.request)
      .field("source", &self.source)
      .finish_non_exhaustive()
  }
}
