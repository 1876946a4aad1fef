//! Edges between connector nodes and the program node.

use serde::{Deserialize, Serialize};

use super::{AttachedConnector, PROGRAM_NODE_ID};

/// Directed edge: input connector → program, or program → output connector.
///
/// Exactly one of the handles is set; it names the relation port on the
/// program node (`table-<name>` or `view-<name>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEdge {
  pub id: String,
  pub source: String,
  pub target: String,
  pub source_handle: Option<String>,
  pub target_handle: Option<String>,
}

impl TopologyEdge {
  /// Edge wiring `attached` to its relation port, or `None` while unwired.
  pub fn for_attachment(id: impl Into<String>, attached: &AttachedConnector) -> Option<Self> {
    let handle = attached.handle()?;
    let edge = if attached.is_input {
      Self {
        id: id.into(),
        source: attached.name.clone(),
        target: PROGRAM_NODE_ID.to_string(),
        source_handle: None,
        target_handle: Some(handle),
      }
    } else {
      Self {
        id: id.into(),
        source: PROGRAM_NODE_ID.to_string(),
        target: attached.name.clone(),
        source_handle: Some(handle),
        target_handle: None,
      }
    };
    Some(edge)
  }

  pub fn touches(&self, node_id: &str) -> bool {
    self.source == node_id || self.target == node_id
  }

  /// True if this edge joins the same endpoints through the same port pair.
  pub fn same_wiring(&self, other: &TopologyEdge) -> bool {
    self.source == other.source
      && self.target == other.target
      && self.source_handle == other.source_handle
      && self.target_handle == other.target_handle
  }
}
