//! Persistent response cache for backend pages.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Stores decoded response bodies keyed by endpoint + page
//! - Serves stored bodies without touching the network
//! - Optionally expires entries after a configurable max age
//! - Collapses concurrent fetches of the same key into one request

mod key;
mod layer;
mod storage;
mod traits;

pub use key::{default_key, CacheKey, KeyFn};
pub use layer::CacheLayer;
pub use storage::{NoopStorage, SqliteStorage};
pub use traits::{CacheEntry, CacheResult, CacheSource, CacheStorage};
