//! Immutable view of the topology handed to renderers.

use serde::{Deserialize, Serialize};

use super::{TopologyEdge, TopologyNode};

/// Point-in-time copy of the topology graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
  /// Bumped on every published change.
  pub version: u64,
  pub nodes: Vec<TopologyNode>,
  pub edges: Vec<TopologyEdge>,
}

impl TopologySnapshot {
  pub fn node(&self, id: &str) -> Option<&TopologyNode> {
    self.nodes.iter().find(|n| n.id == id)
  }

  pub fn edges_of(&self, id: &str) -> Vec<&TopologyEdge> {
    self.edges.iter().filter(|e| e.touches(id)).collect()
  }

  pub fn connector_count(&self) -> usize {
    self.nodes.iter().filter(|n| n.attached().is_some()).count()
  }

  pub fn placeholder_count(&self) -> usize {
    self.nodes.iter().filter(|n| n.is_placeholder()).count()
  }

  pub fn program_count(&self) -> usize {
    self.nodes.iter().filter(|n| n.is_program()).count()
  }
}
