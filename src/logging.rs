//! File logging setup. Stdout carries CLI output, so logs go to a file.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Environment variable holding a filter directive, e.g. `insights=debug`.
pub const LOG_ENV: &str = "INSIGHTS_LOG";

/// Install the global subscriber. Keep the returned guard alive until exit,
/// or buffered lines are lost.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let path = log_path(config)?;
  let dir = path
    .parent()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(filter(config))
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}

fn filter(config: &LogConfig) -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV)
    .or_else(|_| EnvFilter::try_new(&config.level))
    .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Configured log file, else $XDG_DATA_HOME/insights/insights.log.
pub fn log_path(config: &LogConfig) -> Result<PathBuf> {
  if let Some(path) = &config.file {
    return Ok(path.clone());
  }
  let data_dir = dirs::data_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
  Ok(data_dir.join("insights").join("insights.log"))
}
