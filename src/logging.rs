//! File logging.
//!
//! The terminal belongs to the UI, so events go to a daily-rolling file under
//! the user data directory. `NETDASH_LOG` takes an `EnvFilter` directive and
//! defaults to `info`.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LOG_ENV: &str = "NETDASH_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Directory that receives `netdash.log.YYYY-MM-DD` files.
pub fn log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|dir| dir.join("netdash").join("logs"))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes buffered lines.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir().ok_or_else(|| eyre!("Could not determine data directory for logs"))?;
  std::fs::create_dir_all(&dir)?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, "netdash.log"));

  let file = fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  Registry::default()
    .with(filter())
    .with(file)
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  tracing::info!(dir = %dir.display(), "logging initialized");
  Ok(guard)
}

fn filter() -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_log_dir_is_app_scoped() {
    if let Some(dir) = log_dir() {
      assert!(dir.ends_with("netdash/logs"));
    }
  }
}
