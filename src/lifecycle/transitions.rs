//! Lifecycle state machine, one pipeline at a time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::PipelineStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleCommand {
  Start,
  Pause,
  Shutdown,
}

impl fmt::Display for LifecycleCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LifecycleCommand::Start => write!(f, "start"),
      LifecycleCommand::Pause => write!(f, "pause"),
      LifecycleCommand::Shutdown => write!(f, "shutdown"),
    }
  }
}

/// Status to show as soon as `command` is issued from `current`.
///
/// `None` means the command makes no sense from `current` and is suppressed.
pub fn optimistic(current: PipelineStatus, command: LifecycleCommand) -> Option<PipelineStatus> {
  match (command, current) {
    (
      LifecycleCommand::Start,
      PipelineStatus::Shutdown | PipelineStatus::StartupFailure | PipelineStatus::Paused,
    ) => Some(PipelineStatus::Starting),
    (LifecycleCommand::Pause, PipelineStatus::Running) => Some(PipelineStatus::Pausing),
    (LifecycleCommand::Shutdown, PipelineStatus::Running | PipelineStatus::Paused) => {
      Some(PipelineStatus::ShuttingDown)
    }
    _ => None,
  }
}

/// Status to fall back to when the backend fails `command`.
pub fn on_failure(command: LifecycleCommand, prior: PipelineStatus) -> PipelineStatus {
  match command {
    LifecycleCommand::Start => PipelineStatus::StartupFailure,
    LifecycleCommand::Pause | LifecycleCommand::Shutdown => prior,
  }
}
