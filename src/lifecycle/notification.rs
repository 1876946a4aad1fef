//! User-visible messages raised by lifecycle operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Error,
  Info,
}

/// One message for the notification sink.
///
/// `id` increases monotonically per reconciler, so the UI can order and
/// de-duplicate messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub id: u64,
  pub message: String,
  pub severity: Severity,
  pub raised_at: DateTime<Utc>,
}

impl Notification {
  pub fn new(id: u64, message: impl Into<String>, severity: Severity) -> Self {
    Self {
      id,
      message: message.into(),
      severity,
      raised_at: Utc::now(),
    }
  }

  pub fn error(id: u64, message: impl Into<String>) -> Self {
    Self::new(id, message, Severity::Error)
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}
