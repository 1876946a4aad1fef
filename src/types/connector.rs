//! Connectors and their attachment to a pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the program a connector sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Input,
  Output,
}

impl Direction {
  pub fn from_is_input(is_input: bool) -> Self {
    if is_input {
      Direction::Input
    } else {
      Direction::Output
    }
  }

  /// Prefix of the program-node port a relation of this side is exposed on.
  pub fn handle_prefix(self) -> &'static str {
    match self {
      Direction::Input => "table-",
      Direction::Output => "view-",
    }
  }
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Direction::Input => write!(f, "input"),
      Direction::Output => write!(f, "output"),
    }
  }
}

/// A reusable connector configuration from the connector registry.
///
/// Transport and format settings are opaque here; only the registry and the
/// connector-specific forms interpret them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDescriptor {
  pub connector_id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub config: serde_json::Value,
}

impl ConnectorDescriptor {
  pub fn new(connector_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      connector_id: connector_id.into(),
      name: name.into(),
      description: String::new(),
      config: serde_json::Value::Null,
    }
  }
}

/// Binding of a connector to one pipeline.
///
/// `relation_name` may be empty: attached, but not wired to a relation yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedConnector {
  pub name: String,
  pub connector_id: String,
  #[serde(default)]
  pub relation_name: String,
  pub is_input: bool,
}

impl AttachedConnector {
  pub fn input(
    name: impl Into<String>,
    connector_id: impl Into<String>,
    relation_name: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      connector_id: connector_id.into(),
      relation_name: relation_name.into(),
      is_input: true,
    }
  }

  pub fn output(
    name: impl Into<String>,
    connector_id: impl Into<String>,
    relation_name: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      connector_id: connector_id.into(),
      relation_name: relation_name.into(),
      is_input: false,
    }
  }

  pub fn direction(&self) -> Direction {
    Direction::from_is_input(self.is_input)
  }

  pub fn is_wired(&self) -> bool {
    !self.relation_name.is_empty()
  }

  /// Program-node port this attachment connects to, e.g. `table-orders`.
  /// `None` while unwired.
  pub fn handle(&self) -> Option<String> {
    self
      .is_wired()
      .then(|| format!("{}{}", self.direction().handle_prefix(), self.relation_name))
  }
}
