//! Lifecycle status of a pipeline, as seen by the client and by the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque pipeline identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(pub String);

impl PipelineId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for PipelineId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for PipelineId {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

/// Client view of a pipeline's lifecycle.
///
/// Transient states (`Starting`, `Pausing`, `ShuttingDown`) may be optimistic
/// guesses; the next poll replaces them with the backend's answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
  #[default]
  Shutdown,
  Starting,
  Running,
  Pausing,
  Paused,
  ShuttingDown,
  StartupFailure,
}

impl PipelineStatus {
  /// Connectors may only be rewired while nothing is deployed.
  pub fn allows_topology_edits(self) -> bool {
    matches!(self, PipelineStatus::Shutdown | PipelineStatus::StartupFailure)
  }

  pub fn is_transient(self) -> bool {
    matches!(
      self,
      PipelineStatus::Starting | PipelineStatus::Pausing | PipelineStatus::ShuttingDown
    )
  }
}

impl fmt::Display for PipelineStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipelineStatus::Shutdown => write!(f, "SHUTDOWN"),
      PipelineStatus::Starting => write!(f, "STARTING"),
      PipelineStatus::Running => write!(f, "RUNNING"),
      PipelineStatus::Pausing => write!(f, "PAUSING"),
      PipelineStatus::Paused => write!(f, "PAUSED"),
      PipelineStatus::ShuttingDown => write!(f, "SHUTTING_DOWN"),
      PipelineStatus::StartupFailure => write!(f, "STARTUP_FAILURE"),
    }
  }
}

/// Status the backend reports for a deployed pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPipelineStatus {
  Shutdown,
  Provisioning,
  Initializing,
  Running,
  Paused,
  Failed,
  ShuttingDown,
}

impl From<BackendPipelineStatus> for PipelineStatus {
  fn from(status: BackendPipelineStatus) -> Self {
    match status {
      BackendPipelineStatus::Shutdown => PipelineStatus::Shutdown,
      BackendPipelineStatus::Provisioning | BackendPipelineStatus::Initializing => {
        PipelineStatus::Starting
      }
      BackendPipelineStatus::Running => PipelineStatus::Running,
      BackendPipelineStatus::Paused => PipelineStatus::Paused,
      BackendPipelineStatus::Failed => PipelineStatus::StartupFailure,
      BackendPipelineStatus::ShuttingDown => PipelineStatus::ShuttingDown,
    }
  }
}
