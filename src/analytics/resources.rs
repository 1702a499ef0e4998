//! The analytics resources the backend serves.

use crate::pipeline::Endpoint;

/// One backend resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
  Anomalies,
  ClusterOverview,
  ClusterLogs { cluster: i64 },
  Hotspots,
  Protocols,
}

impl Resource {
  pub fn endpoint(&self) -> Endpoint {
    match self {
      Resource::Anomalies => Endpoint::new("/test-anomalies"),
      Resource::ClusterOverview => Endpoint::new("/clusters/overview"),
      Resource::ClusterLogs { cluster } => Endpoint::new(format!("/clusters/{}", cluster)),
      Resource::Hotspots => Endpoint::new("/hotspots"),
      Resource::Protocols => Endpoint::new("/protocols/predict"),
    }
  }

  pub fn title(&self) -> String {
    match self {
      Resource::Anomalies => "Anomalies".to_string(),
      Resource::ClusterOverview => "Clusters".to_string(),
      Resource::ClusterLogs { cluster } => format!("Cluster {}", cluster),
      Resource::Hotspots => "Hotspots".to_string(),
      Resource::Protocols => "Protocols".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::default_key;

  #[test]
  fn test_endpoint_paths() {
    assert_eq!(Resource::Anomalies.endpoint().path(), "/test-anomalies");
    assert_eq!(
      Resource::ClusterLogs { cluster: 0 }.endpoint().path(),
      "/clusters/0"
    );
  }

  #[test]
  fn test_cluster_keys_do_not_collide_with_overview() {
    let overview = default_key(&Resource::ClusterOverview.endpoint(), 1);
    let logs = default_key(&Resource::ClusterLogs { cluster: 2 }.endpoint(), 1);
    assert_eq!(overview.as_str(), "clusters-overview-page-1");
    assert_eq!(logs.as_str(), "clusters-2-page-1");
  }
}
