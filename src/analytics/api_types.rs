//! Serde-deserializable types matching analytics backend responses.
//!
//! The backend serializes dataframe rows as-is, so log records use the
//! dataframe column names (`Source`, `Predicted_Protocol`, ...). Unknown
//! fields are ignored.

use serde::Deserialize;

use crate::pagination::Paged;

// ============================================================================
// Common nested types
// ============================================================================

/// One captured packet log row.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogRecord {
  #[serde(rename = "_id", default)]
  pub id: Option<String>,
  /// Tenths of a second before now
  #[serde(rename = "Timestamp", default)]
  pub timestamp: Option<f64>,
  #[serde(rename = "Source", default)]
  pub source: String,
  #[serde(rename = "Destination", default)]
  pub destination: String,
  #[serde(rename = "Protocol", default)]
  pub protocol: String,
  #[serde(rename = "Length", default)]
  pub length: f64,
  #[serde(rename = "Info", default)]
  pub info: Option<String>,
  #[serde(rename = "Predicted_Protocol", default)]
  pub predicted_protocol: Option<String>,
  #[serde(rename = "Mismatch", default)]
  pub mismatch: Option<bool>,
}

/// Packet length statistics.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LengthStats {
  pub avg_length: Option<f64>,
  pub min_length: Option<f64>,
  pub max_length: Option<f64>,
}

/// Share of traffic for one address or protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct RankedEntry {
  /// Address or protocol name, whichever column the ranking is over
  #[serde(alias = "Destination", alias = "Source", alias = "Protocol")]
  pub name: String,
  #[serde(rename = "Count")]
  pub count: u64,
  #[serde(rename = "Percentage", default)]
  pub percentage: f64,
}

// ============================================================================
// Anomalies
// ============================================================================

/// How much of the traffic the anomaly model flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Harshness {
  Critical,
  High,
  Moderate,
  Low,
  #[serde(rename = "No Data")]
  NoData,
  #[serde(other)]
  Unknown,
}

impl Harshness {
  pub fn label(&self) -> &'static str {
    match self {
      Harshness::Critical => "Critical",
      Harshness::High => "High",
      Harshness::Moderate => "Moderate",
      Harshness::Low => "Low",
      Harshness::NoData => "No Data",
      Harshness::Unknown => "Unknown",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomaliesPage {
  pub total_logs: u64,
  pub anomaly_count: u64,
  pub harshness: Harshness,
  #[serde(default)]
  pub anomalies: Vec<LogRecord>,
}

impl Paged for AnomaliesPage {
  fn page_len(&self) -> usize {
    self.anomalies.len()
  }
}

// ============================================================================
// Clusters
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSummary {
  pub cluster: i64,
  pub size: u64,
  pub avg_length: f64,
  pub min_length: f64,
  pub max_length: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterOverview {
  pub total_logs: u64,
  pub total_clusters: u64,
  #[serde(default)]
  pub clusters: Vec<ClusterSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterLogsPage {
  /// Logs in this cluster across all pages
  pub total_logs: u64,
  #[serde(default)]
  pub stats: LengthStats,
  #[serde(default)]
  pub logs: Vec<LogRecord>,
}

impl Paged for ClusterLogsPage {
  fn page_len(&self) -> usize {
    self.logs.len()
  }
}

// ============================================================================
// Hotspots
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HotspotsReport {
  pub total_logs: u64,
  #[serde(default)]
  pub top_destinations: Vec<RankedEntry>,
  #[serde(default)]
  pub top_sources: Vec<RankedEntry>,
  #[serde(default)]
  pub top_protocols: Vec<RankedEntry>,
  #[serde(default)]
  pub length_stats: LengthStats,
}

// ============================================================================
// Protocol prediction
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolPredictions {
  pub total_logs: u64,
  pub match_percentage: f64,
  pub mismatch_count: u64,
  #[serde(default)]
  pub logs: Vec<LogRecord>,
}

impl Paged for ProtocolPredictions {
  fn page_len(&self) -> usize {
    self.logs.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_anomalies_page() {
    let page: AnomaliesPage = serde_json::from_value(json!({
      "total_logs": 1000,
      "anomaly_count": 150,
      "harshness": "Moderate",
      "anomalies": [
        {"_id": "65a1", "Timestamp": 42.0, "Source": "10.0.0.1", "Destination": "10.0.0.2",
         "Protocol": "TCP", "Length": 1514, "No.": 7}
      ],
      "page": 1,
      "limit": 10
    }))
    .unwrap();

    assert_eq!(page.harshness, Harshness::Moderate);
    assert_eq!(page.page_len(), 1);
    assert_eq!(page.anomalies[0].source, "10.0.0.1");
    assert_eq!(page.anomalies[0].length, 1514.0);
  }

  #[test]
  fn test_harshness_no_data_and_unknown() {
    let h: Harshness = serde_json::from_value(json!("No Data")).unwrap();
    assert_eq!(h, Harshness::NoData);
    let h: Harshness = serde_json::from_value(json!("Apocalyptic")).unwrap();
    assert_eq!(h, Harshness::Unknown);
  }

  #[test]
  fn test_hotspots_ranked_entries_use_column_names() {
    let report: HotspotsReport = serde_json::from_value(json!({
      "total_logs": 120,
      "top_destinations": [{"Destination": "8.8.8.8", "Count": 40, "Percentage": 33.3}],
      "top_sources": [{"Source": "192.168.1.5", "Count": 30, "Percentage": 25.0}],
      "top_protocols": [{"Protocol": "DNS", "Count": 60, "Percentage": 50.0}],
      "length_stats": {"avg_length": 120.5, "min_length": 60, "max_length": 1514}
    }))
    .unwrap();

    assert_eq!(report.top_destinations[0].name, "8.8.8.8");
    assert_eq!(report.top_sources[0].name, "192.168.1.5");
    assert_eq!(report.top_protocols[0].name, "DNS");
    assert_eq!(report.length_stats.max_length, Some(1514.0));
  }

  #[test]
  fn test_hotspots_minimal_body() {
    let report: HotspotsReport =
      serde_json::from_value(json!({"total_logs": 120, "top_destinations": []})).unwrap();
    assert!(report.top_sources.is_empty());
    assert!(report.length_stats.avg_length.is_none());
  }

  #[test]
  fn test_protocol_predictions() {
    let page: ProtocolPredictions = serde_json::from_value(json!({
      "total_logs": 2,
      "match_percentage": 50.0,
      "mismatch_count": 1,
      "logs": [
        {"Protocol": "TCP", "Predicted_Protocol": "TCP", "Mismatch": false, "Length": 60},
        {"Protocol": "UDP", "Predicted_Protocol": "TCP", "Mismatch": true, "Length": 90}
      ]
    }))
    .unwrap();

    assert_eq!(page.page_len(), 2);
    assert_eq!(page.logs[1].mismatch, Some(true));
  }

  #[test]
  fn test_cluster_logs_with_empty_stats() {
    let page: ClusterLogsPage = serde_json::from_value(json!({
      "total_logs": 0,
      "page": 1,
      "limit": 10,
      "stats": {"avg_length": null, "min_length": null, "max_length": null},
      "logs": []
    }))
    .unwrap();
    assert_eq!(page.page_len(), 0);
    assert!(page.stats.avg_length.is_none());
  }
}
