//! Engine configuration: JSON file, then environment overrides.
//!
//! - `PIPELINE_TOPOLOGY_POLL_MS`: status poll interval in milliseconds.
//! - `PIPELINE_TOPOLOGY_ROW_HEIGHT`: vertical spacing of layout rows.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ConfigError;
use crate::layout::{LayoutConfig, LayoutEngine};
use crate::lifecycle::{NotificationSink, PipelineBackend, QueryCache, Reconciler};
use crate::topology_store::TopologyStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL_ENV: &str = "PIPELINE_TOPOLOGY_POLL_MS";
pub const ROW_HEIGHT_ENV: &str = "PIPELINE_TOPOLOGY_ROW_HEIGHT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub poll_interval_ms: u64,
  pub layout: LayoutConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
      layout: LayoutConfig::default(),
    }
  }
}

impl EngineConfig {
  /// Defaults, or `path` if given, with environment overrides applied.
  #[instrument(level = "trace")]
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let base = match path {
      Some(p) => Self::from_file(p)?,
      None => Self::default(),
    };
    base.with_overrides(|key| std::env::var(key).ok())
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let bytes = std::fs::read(path)?;
    let config: Self = serde_json::from_slice(&bytes)?;
    debug!(path = %path.display(), "config file loaded");
    config.validated()
  }

  /// Applies overrides looked up by variable name (normally the environment).
  pub fn with_overrides(
    mut self,
    lookup: impl Fn(&str) -> Option<String>,
  ) -> Result<Self, ConfigError> {
    if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
      self.poll_interval_ms = raw.trim().parse().map_err(|_| invalid(POLL_INTERVAL_ENV, &raw))?;
    }
    if let Some(raw) = lookup(ROW_HEIGHT_ENV) {
      self.layout.row_height = raw.trim().parse().map_err(|_| invalid(ROW_HEIGHT_ENV, &raw))?;
    }
    self.validated()
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn topology_store(&self) -> TopologyStore {
    TopologyStore::new(LayoutEngine::new(self.layout))
  }

  pub fn reconciler(
    &self,
    backend: Arc<dyn PipelineBackend>,
    cache: Arc<dyn QueryCache>,
    notifications: Arc<dyn NotificationSink>,
  ) -> Reconciler {
    Reconciler::with_poll_interval(backend, cache, notifications, self.poll_interval())
  }

  fn validated(self) -> Result<Self, ConfigError> {
    if self.poll_interval_ms == 0 {
      return Err(invalid("poll_interval_ms", "0"));
    }
    let row = self.layout.row_height;
    if !row.is_finite() || row <= 0.0 {
      return Err(invalid("layout.row_height", &row.to_string()));
    }
    Ok(self)
  }
}

fn invalid(key: &str, value: &str) -> ConfigError {
  ConfigError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
  }
}
