use crate::config::Config;
use crate::error::FetchError;
use crate::pipeline::{Backend, PageRequest};
use color_eyre::{eyre::eyre, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the analytics backend
#[derive(Clone)]
pub struct AnalyticsClient {
  client: reqwest::Client,
  base_url: Url,
}

impl AnalyticsClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_timeout(
      &config.backend.url,
      Duration::from_secs(config.backend.timeout_secs),
    )
  }

  pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
    let mut base_url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid backend URL {}: {}", base_url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("Backend URL {} cannot be used as a base", base_url));
    }
    // Keep any path prefix when joining endpoint paths
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("netdash/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Full URL for a page request: `{base}{endpoint}?page={n}&limit={m}`
  pub fn url_for(&self, request: &PageRequest) -> Result<Url, FetchError> {
    let mut url = self
      .base_url
      .join(request.endpoint.path().trim_start_matches('/'))
      .map_err(|e| FetchError::Transport(format!("invalid endpoint {}: {}", request.endpoint.path(), e)))?;

    url
      .query_pairs_mut()
      .append_pair("page", &request.cursor.page().to_string())
      .append_pair("limit", &request.cursor.limit().to_string());

    Ok(url)
  }

  /// GET a page and decode the JSON body
  pub async fn get_page(&self, request: &PageRequest) -> Result<Value, FetchError> {
    let url = self.url_for(request)?;
    debug!(%url, "GET");

    let response = self.client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
      });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

impl Backend for AnalyticsClient {
  fn get(&self, request: &PageRequest) -> BoxFuture<'static, Result<Value, FetchError>> {
    let client = self.clone();
    let request = request.clone();
    async move { client.get_page(&request).await }.boxed()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analytics::api_types::HotspotsReport;
  use crate::analytics::Resource;
  use crate::cache::{CacheKey, CacheStorage, SqliteStorage};
  use crate::pagination::PageCursor;
  use crate::pipeline::Pipeline;
  use crate::query::Query;
  use serde_json::json;
  use std::sync::Arc;
  use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
  };

  fn client(server: &MockServer) -> AnalyticsClient {
    AnalyticsClient::with_timeout(&server.uri(), Duration::from_secs(5)).unwrap()
  }

  fn hotspots_page(page: u32) -> PageRequest {
    PageRequest::new(Resource::Hotspots.endpoint(), PageCursor::new(page, 50))
  }

  #[test]
  fn test_url_for_adds_page_and_limit() {
    let client =
      AnalyticsClient::with_timeout("http://localhost:8000", Duration::from_secs(1)).unwrap();
    let url = client.url_for(&hotspots_page(2)).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8000/hotspots?page=2&limit=50");
  }

  #[test]
  fn test_url_for_keeps_base_path() {
    let client =
      AnalyticsClient::with_timeout("http://example.com/api", Duration::from_secs(1)).unwrap();
    let request = PageRequest::new(Resource::Protocols.endpoint(), PageCursor::new(1, 10));
    let url = client.url_for(&request).unwrap();
    assert_eq!(
      url.as_str(),
      "http://example.com/api/protocols/predict?page=1&limit=10"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(AnalyticsClient::with_timeout("not a url", Duration::from_secs(1)).is_err());
  }

  #[tokio::test]
  async fn test_get_page_decodes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/hotspots"))
      .and(query_param("page", "1"))
      .and(query_param("limit", "50"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_logs": 120})))
      .expect(1)
      .mount(&server)
      .await;

    let body = client(&server).get_page(&hotspots_page(1)).await.unwrap();
    assert_eq!(body, json!({"total_logs": 120}));
  }

  #[tokio::test]
  async fn test_get_page_maps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/hotspots"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let err = client(&server)
      .get_page(&hotspots_page(1))
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::HttpStatus { status: 500, .. }));
  }

  #[tokio::test]
  async fn test_get_page_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
      .mount(&server)
      .await;

    let err = client(&server)
      .get_page(&hotspots_page(1))
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
  }

  #[tokio::test]
  async fn test_unreachable_backend_is_transport_error() {
    // Port 9 (discard) is not listening in test environments
    let client =
      AnalyticsClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = client.get_page(&hotspots_page(1)).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
  }

  #[tokio::test]
  async fn test_hotspots_load_end_to_end() {
    let server = MockServer::start().await;
    let destinations: Vec<_> = (0..10)
      .map(|i| json!({"Destination": format!("10.0.0.{i}"), "Count": 20 - i, "Percentage": 5.0}))
      .collect();
    let body = json!({"total_logs": 120, "top_destinations": destinations});

    // A second network request would fail the expectation on drop
    Mock::given(method("GET"))
      .and(path("/hotspots"))
      .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
      .expect(1)
      .mount(&server)
      .await;

    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let pipeline = Pipeline::from_parts(
      Arc::new(client(&server)),
      crate::cache::CacheLayer::from_shared(storage.clone()),
    );

    let mut query = Query::<HotspotsReport>::new();
    query.load(&pipeline, hotspots_page(1));
    for _ in 0..100 {
      if query.poll() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let report = query.data().unwrap();
    assert_eq!(report.total_logs, 120);
    assert_eq!(report.top_destinations.len(), 10);
    assert_eq!(
      storage.get(&CacheKey::new("hotspots-page-1")).unwrap().unwrap().data,
      body
    );

    let mut again = Query::<HotspotsReport>::new();
    assert!(again.load(&pipeline, hotspots_page(1)).is_success());
  }

  #[tokio::test]
  async fn test_failed_load_retries_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/protocols/predict"))
      .respond_with(ResponseTemplate::new(500))
      .expect(2)
      .mount(&server)
      .await;

    let pipeline = Pipeline::new(client(&server), SqliteStorage::open_in_memory().unwrap());
    let request = PageRequest::new(Resource::Protocols.endpoint(), PageCursor::first(50));

    for _ in 0..2 {
      let result = pipeline.fetch::<Value>(request.clone()).await;
      assert!(matches!(result, Err(FetchError::HttpStatus { status: 500, .. })));
      assert!(pipeline.cached::<Value>(&request).is_none());
    }
  }
}
