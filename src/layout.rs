//! Layered placement of topology nodes.
//!
//! Three columns: inputs on the left, the program in the middle, outputs on
//! the right. Within a side column nodes keep insertion order, with the
//! placeholder last so it stays the drop target below the attached connectors.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::{Direction, NodeKind, Position, TopologyNode};

/// Column and row geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
  pub input_x: f64,
  pub program_x: f64,
  pub output_x: f64,
  /// Vertical distance between two nodes of one column.
  pub row_height: f64,
  pub top: f64,
}

impl Default for LayoutConfig {
  fn default() -> Self {
    Self {
      input_x: 0.0,
      program_x: 400.0,
      output_x: 800.0,
      row_height: 120.0,
      top: 0.0,
    }
  }
}

/// Stateless layout calculator; same nodes in, same positions out.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
  config: LayoutConfig,
}

impl LayoutEngine {
  pub fn new(config: LayoutConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &LayoutConfig {
    &self.config
  }

  /// Positions for every node not in `dragging`, in node order.
  ///
  /// Dragged nodes still occupy their slot so the column does not reflow
  /// under the pointer.
  #[instrument(level = "trace", skip_all, fields(nodes = nodes.len(), dragging = dragging.len()))]
  pub fn recompute(
    &self,
    nodes: &[TopologyNode],
    dragging: &HashSet<String>,
  ) -> Vec<(String, Position)> {
    let inputs = self.column(nodes, Direction::Input);
    let outputs = self.column(nodes, Direction::Output);
    let tallest = inputs.len().max(outputs.len()).max(1);
    let program_y = self.config.top + (tallest - 1) as f64 * self.config.row_height / 2.0;

    let mut placed = Vec::with_capacity(nodes.len());
    for node in nodes {
      if dragging.contains(&node.id) {
        continue;
      }
      let position = match node.direction() {
        None => Position::new(self.config.program_x, program_y),
        Some(direction) => {
          let (column, x) = match direction {
            Direction::Input => (&inputs, self.config.input_x),
            Direction::Output => (&outputs, self.config.output_x),
          };
          let row = column.iter().position(|id| *id == node.id).unwrap_or(0);
          Position::new(x, self.row_y(row))
        }
      };
      placed.push((node.id.clone(), position));
    }
    placed
  }

  /// Writes recomputed positions into `nodes`.
  pub fn apply(&self, nodes: &mut [TopologyNode], dragging: &HashSet<String>) {
    let placed = self.recompute(nodes, dragging);
    for (id, position) in placed {
      if let Some(node) = nodes.iter_mut().find(|n| n.id == id) {
        node.position = position;
      }
    }
  }

  fn row_y(&self, row: usize) -> f64 {
    self.config.top + row as f64 * self.config.row_height
  }

  /// Ids on one side: connectors in insertion order, then the placeholder.
  fn column<'a>(&self, nodes: &'a [TopologyNode], direction: Direction) -> Vec<&'a str> {
    let side = nodes.iter().filter(|n| n.direction() == Some(direction));
    let connectors = side
      .clone()
      .filter(|n| matches!(n.kind, NodeKind::Connector { .. }));
    let placeholders = side.filter(|n| n.is_placeholder());
    connectors.chain(placeholders).map(|n| n.id.as_str()).collect()
  }
}
