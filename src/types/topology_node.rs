//! Nodes of the pipeline topology graph.

use serde::{Deserialize, Serialize};

use super::{AttachedConnector, ConnectorDescriptor, Direction};

/// Fixed id of the program node.
pub const PROGRAM_NODE_ID: &str = "sql";
/// Fixed id of the input drop target.
pub const INPUT_PLACEHOLDER_ID: &str = "inputPlaceholder";
/// Fixed id of the output drop target.
pub const OUTPUT_PLACEHOLDER_ID: &str = "outputPlaceholder";

/// Returns the placeholder id for the given side.
pub fn placeholder_id(direction: Direction) -> &'static str {
  match direction {
    Direction::Input => INPUT_PLACEHOLDER_ID,
    Direction::Output => OUTPUT_PLACEHOLDER_ID,
  }
}

/// Returns true if `id` names the program node or a placeholder.
pub fn is_protected_id(id: &str) -> bool {
  id == PROGRAM_NODE_ID || id == INPUT_PLACEHOLDER_ID || id == OUTPUT_PLACEHOLDER_ID
}

/// Presentation-only coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
  Program,
  Connector {
    connector: ConnectorDescriptor,
    attached: AttachedConnector,
  },
  Placeholder { direction: Direction },
}

/// A node in the topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
  pub id: String,
  pub position: Position,
  #[serde(flatten)]
  pub kind: NodeKind,
}

impl TopologyNode {
  pub fn program(position: Position) -> Self {
    Self {
      id: PROGRAM_NODE_ID.to_string(),
      position,
      kind: NodeKind::Program,
    }
  }

  pub fn placeholder(direction: Direction, position: Position) -> Self {
    Self {
      id: placeholder_id(direction).to_string(),
      position,
      kind: NodeKind::Placeholder { direction },
    }
  }

  /// Connector node; its id is the attachment name.
  pub fn connector(
    connector: ConnectorDescriptor,
    attached: AttachedConnector,
    position: Position,
  ) -> Self {
    Self {
      id: attached.name.clone(),
      position,
      kind: NodeKind::Connector { connector, attached },
    }
  }

  pub fn is_program(&self) -> bool {
    matches!(self.kind, NodeKind::Program)
  }

  pub fn is_placeholder(&self) -> bool {
    matches!(self.kind, NodeKind::Placeholder { .. })
  }

  pub fn attached(&self) -> Option<&AttachedConnector> {
    match &self.kind {
      NodeKind::Connector { attached, .. } => Some(attached),
      _ => None,
    }
  }

  /// Side of the program the node is laid out on; `None` for the program node.
  pub fn direction(&self) -> Option<Direction> {
    match &self.kind {
      NodeKind::Program => None,
      NodeKind::Connector { attached, .. } => Some(attached.direction()),
      NodeKind::Placeholder { direction } => Some(*direction),
    }
  }
}
