use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub backend: BackendConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub page_size: PageSizeConfig,
  /// Custom title for header (defaults to the backend host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  #[serde(default = "default_backend_url")]
  pub url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url: default_backend_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_backend_url() -> String {
  DEFAULT_BACKEND_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// When false every load goes to the backend
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Entries older than this are fetched again. Unset keeps entries forever.
  pub max_age_secs: Option<u64>,
  /// Database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      max_age_secs: None,
      path: None,
    }
  }
}

fn default_true() -> bool {
  true
}

/// Items requested per page, by view.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSizeConfig {
  #[serde(default = "default_anomalies_page")]
  pub anomalies: u32,
  #[serde(default = "default_protocols_page")]
  pub protocols: u32,
  #[serde(default = "default_cluster_logs_page")]
  pub cluster_logs: u32,
  /// Used by resources that are not paginated
  #[serde(default = "default_protocols_page")]
  pub default: u32,
}

impl Default for PageSizeConfig {
  fn default() -> Self {
    Self {
      anomalies: default_anomalies_page(),
      protocols: default_protocols_page(),
      cluster_logs: default_cluster_logs_page(),
      default: default_protocols_page(),
    }
  }
}

fn default_anomalies_page() -> u32 {
  10
}

fn default_protocols_page() -> u32 {
  50
}

fn default_cluster_logs_page() -> u32 {
  10
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./netdash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/netdash/config.yaml
  ///
  /// Falls back to defaults when no file is found. The backend URL can be
  /// overridden with NETDASH_BACKEND_URL.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("NETDASH_BACKEND_URL") {
      config.backend.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("netdash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("netdash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.backend.url, "http://localhost:8000");
    assert_eq!(config.backend.timeout_secs, 30);
    assert!(config.cache.enabled);
    assert!(config.cache.max_age_secs.is_none());
    assert_eq!(config.page_size.anomalies, 10);
    assert_eq!(config.page_size.protocols, 50);
    assert_eq!(config.page_size.cluster_logs, 10);
  }

  #[test]
  fn test_parse_partial_file() {
    let config = Config::parse(
      "backend:\n  url: http://analytics:9000\ncache:\n  max_age_secs: 600\npage_size:\n  anomalies: 25\n",
    )
    .unwrap();

    assert_eq!(config.backend.url, "http://analytics:9000");
    assert_eq!(config.backend.timeout_secs, 30);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.max_age_secs, Some(600));
    assert_eq!(config.page_size.anomalies, 25);
    assert_eq!(config.page_size.protocols, 50);
  }

  #[test]
  fn test_parse_empty_file() {
    let config = Config::parse("\n").unwrap();
    assert_eq!(config.backend.url, DEFAULT_BACKEND_URL);
  }

  #[test]
  fn test_parse_rejects_bad_types() {
    assert!(Config::parse("page_size:\n  anomalies: lots\n").is_err());
  }

  #[test]
  fn test_load_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "title: Lab traffic\ncache:\n  enabled: false").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.title.as_deref(), Some("Lab traffic"));
    assert!(!config.cache.enabled);
  }

  #[test]
  fn test_load_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/netdash.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
