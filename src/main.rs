mod analytics;
mod app;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod logging;
mod pager;
mod pagination;
mod pipeline;
mod query;
mod ui;

use crate::analytics::AnalyticsClient;
use crate::app::{App, StartView};
use crate::cache::{CacheLayer, CacheStorage, NoopStorage, SqliteStorage};
use crate::config::Config;
use crate::pipeline::Pipeline;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "netdash")]
#[command(about = "A terminal dashboard for network-traffic analytics")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./netdash.yaml, then $XDG_CONFIG_HOME/netdash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Analytics backend base URL
  #[arg(short, long)]
  backend: Option<String>,

  /// Always fetch from the backend
  #[arg(long)]
  no_cache: bool,

  /// Empty the response cache before starting
  #[arg(long)]
  clear_cache: bool,

  /// View to open first
  #[arg(short, long, value_enum, default_value_t = StartView::Overview)]
  view: StartView,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init()?;

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(url) = args.backend {
    config.backend.url = url;
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let storage = open_storage(&config)?;
  if args.clear_cache {
    let removed = storage.clear()?;
    info!(removed, "cache cleared at startup");
  }

  let mut cache = CacheLayer::from_shared(storage);
  if let Some(secs) = config.cache.max_age_secs {
    let max_age = chrono::Duration::try_seconds(i64::try_from(secs)?)
      .ok_or_else(|| eyre!("cache.max_age_secs is out of range: {}", secs))?;
    cache = cache.with_max_age(max_age);
  }

  let client = AnalyticsClient::new(&config)?;
  info!(backend = %client.base_url(), cache = config.cache.enabled, "starting");
  let pipeline = Pipeline::from_parts(Arc::new(client), cache);

  let mut app = App::new(config, pipeline, args.view);
  app.run().await?;

  Ok(())
}

fn open_storage(config: &Config) -> Result<Arc<dyn CacheStorage>> {
  if !config.cache.enabled {
    return Ok(Arc::new(NoopStorage));
  }
  let storage = match &config.cache.path {
    Some(path) => SqliteStorage::open_at(path)?,
    None => SqliteStorage::open()?,
  };
  Ok(Arc::new(storage))
}
