//! Error types for topology edits, lifecycle commands and configuration.

use thiserror::Error;

/// Structural failures of the topology store.
///
/// A relation missing from the schema is not one of these: such attachments
/// are kept, just without an edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
  /// A node that must always exist (program, placeholder) is missing.
  #[error("invalid graph state: {0}")]
  InvalidGraphState(String),

  /// The caller asked for a change the graph does not allow.
  #[error("invalid operation: {0}")]
  InvalidOperation(String),
}

/// Failures of a backend call issued by the lifecycle reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  /// The backend answered and refused the command.
  #[error("command rejected: {message}")]
  CommandRejected { message: String },

  /// The backend could not be reached.
  #[error("transport failure: {0}")]
  TransportFailure(String),
}

impl CommandError {
  pub fn rejected(message: impl Into<String>) -> Self {
    CommandError::CommandRejected {
      message: message.into(),
    }
  }

  /// Text shown to the user in a notification.
  pub fn user_message(&self) -> String {
    match self {
      CommandError::CommandRejected { message } => message.clone(),
      CommandError::TransportFailure(reason) => format!("Unable to reach the pipeline service: {reason}"),
    }
  }
}

/// Failures loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid value for {key}: {value}")]
  InvalidValue { key: String, value: String },
}

/// Failures loading or editing a session fixture.
#[derive(Debug, Error)]
pub enum SessionError {
  #[error("failed to read session: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse session: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid edit '{0}'")]
  InvalidEdit(String),

  #[error(transparent)]
  Topology(#[from] TopologyError),
}
