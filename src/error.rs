//! Errors produced while loading a resource from the analytics backend.

use thiserror::Error;

/// Why a single load attempt failed.
///
/// Every variant collapses to `RequestState::Failed` at the call site. The
/// error is `Clone` so a de-duplicated fetch can hand the same failure to
/// every caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  /// Backend unreachable, connection reset, timeout
  #[error("network error: {0}")]
  Transport(String),

  /// Backend answered with a non-2xx status
  #[error("HTTP {status} from {url}")]
  HttpStatus { status: u16, url: String },

  /// Body was not JSON or did not match the expected shape
  #[error("malformed response: {0}")]
  Decode(String),
}

impl FetchError {
  /// Short label for status lines.
  pub fn kind(&self) -> &'static str {
    match self {
      FetchError::Transport(_) => "transport",
      FetchError::HttpStatus { .. } => "http",
      FetchError::Decode(_) => "decode",
    }
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      FetchError::Decode(e.to_string())
    } else {
      FetchError::Transport(e.to_string())
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(e: serde_json::Error) -> Self {
    FetchError::Decode(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_http_status_message() {
    let err = FetchError::HttpStatus {
      status: 500,
      url: "http://localhost:8000/hotspots".to_string(),
    };
    assert_eq!(err.to_string(), "HTTP 500 from http://localhost:8000/hotspots");
    assert_eq!(err.kind(), "http");
  }

  #[test]
  fn test_json_error_is_decode() {
    let err: FetchError = serde_json::from_str::<serde_json::Value>("{not json")
      .unwrap_err()
      .into();
    assert_eq!(err.kind(), "decode");
  }
}
