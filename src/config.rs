use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::insights::ReportKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub service: ServiceConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Base URL of the insight service; endpoints are resolved beneath it
  pub url: Option<String>,
  /// Per-request timeout, surfaced to callers as a network failure
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      url: None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

impl ServiceConfig {
  /// Base URL with a trailing slash, so relative endpoints land beneath it.
  pub fn base_url(&self) -> Result<Url> {
    let raw = self.url.as_deref().ok_or_else(|| {
      eyre!("No insight service URL configured. Set service.url or INSIGHTS_SERVICE_URL.")
    })?;

    let mut url = Url::parse(raw).map_err(|e| eyre!("Invalid service URL {}: {}", raw, e))?;
    if !url.path().ends_with('/') {
      let path = format!("{}/", url.path());
      url.set_path(&path);
    }
    Ok(url)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a fetched report counts as fresh
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
  /// Per-kind TTLs, e.g. `energy_patterns: 900`
  #[serde(default)]
  pub ttl_overrides: HashMap<ReportKind, u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
      ttl_overrides: HashMap::new(),
    }
  }
}

fn default_ttl_secs() -> u64 {
  5 * 60
}

impl CacheConfig {
  pub fn ttl_for(&self, kind: ReportKind) -> Duration {
    let secs = self
      .ttl_overrides
      .get(&kind)
      .copied()
      .unwrap_or(self.ttl_secs);
    Duration::from_std(std::time::Duration::from_secs(secs)).unwrap_or(Duration::MAX)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Default filter directive; INSIGHTS_LOG overrides it
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Log file path (default: $XDG_DATA_HOME/insights/insights.log)
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./insights.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/insights/config.yaml
  ///
  /// Without any file the defaults apply. INSIGHTS_SERVICE_URL overrides
  /// `service.url` either way.
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

    if let Ok(url) = std::env::var("INSIGHTS_SERVICE_URL") {
      config.service.url = Some(url);
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("insights.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("insights").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Get the insight service bearer token from the environment, if any.
  ///
  /// Checks INSIGHTS_API_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("INSIGHTS_API_TOKEN")
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}
