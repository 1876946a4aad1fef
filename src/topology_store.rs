//! Single-writer owner of the pipeline topology graph.
//!
//! The store keeps one program node and two placeholders at all times.
//! Connector nodes come and go through [`TopologyStore::attach`],
//! [`TopologyStore::detach`] and [`TopologyStore::hydrate`]. An edge between
//! a connector and the program exists only while the connector's relation
//! is present in the current schema.
//!
//! Readers never borrow the graph: they take an `Arc<TopologySnapshot>`, either
//! directly via [`TopologyStore::snapshot`] or by subscribing to changes.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, instrument, warn};

use crate::error::TopologyError;
use crate::layout::LayoutEngine;
use crate::schema_matcher;
use crate::types::{
  AttachedConnector, ConnectorDescriptor, Direction, NodeKind, PROGRAM_NODE_ID, Position,
  ProgramSchema, TopologyEdge, TopologyNode, TopologySnapshot, is_protected_id, placeholder_id,
};

/// Nodes and edges, without presentation or publication concerns.
#[derive(Debug, Clone)]
pub(crate) struct Graph {
  pub(crate) nodes: Vec<TopologyNode>,
  pub(crate) edges: Vec<TopologyEdge>,
}

impl Graph {
  fn seeded() -> Self {
    Self {
      nodes: vec![
        TopologyNode::program(Position::default()),
        TopologyNode::placeholder(Direction::Input, Position::default()),
        TopologyNode::placeholder(Direction::Output, Position::default()),
      ],
      edges: vec![],
    }
  }

  fn node(&self, id: &str) -> Option<&TopologyNode> {
    self.nodes.iter().find(|n| n.id == id)
  }

  fn node_mut(&mut self, id: &str) -> Option<&mut TopologyNode> {
    self.nodes.iter_mut().find(|n| n.id == id)
  }

  fn contains(&self, id: &str) -> bool {
    self.node(id).is_some()
  }

  fn require_program(&self) -> Result<(), TopologyError> {
    if self.contains(PROGRAM_NODE_ID) {
      Ok(())
    } else {
      error!("program node missing from topology");
      Err(TopologyError::InvalidGraphState(
        "program node is missing".to_string(),
      ))
    }
  }

  /// Adds a connector node at its placeholder's slot and wires it if the
  /// relation matches. Fails before touching anything if a fixed node is gone.
  fn insert_connector(
    &mut self,
    connector: ConnectorDescriptor,
    attached: AttachedConnector,
    schema: Option<&ProgramSchema>,
    offset: f64,
  ) -> Result<(), TopologyError> {
    let direction = attached.direction();
    let placeholder = placeholder_id(direction);
    let Some(slot) = self.node(placeholder).map(|n| n.position) else {
      error!(placeholder, "placeholder missing from topology");
      return Err(TopologyError::InvalidGraphState(format!(
        "{direction} placeholder is missing"
      )));
    };
    let wired = schema_matcher::matches(&attached, schema);
    if wired {
      self.require_program()?;
    }

    if let Some(p) = self.node_mut(placeholder) {
      p.position = Position::new(slot.x, slot.y + offset);
    }
    let id = attached.name.clone();
    self
      .nodes
      .push(TopologyNode::connector(connector, attached, slot));
    self.rewire(&id, schema);
    Ok(())
  }

  /// Brings the edges of connector `id` in line with its attachment and `schema`.
  ///
  /// Keeps an existing edge with the right wiring, drops every other edge of
  /// the node, and adds the missing one.
  fn rewire(&mut self, id: &str, schema: Option<&ProgramSchema>) {
    let desired = self
      .node(id)
      .and_then(|n| n.attached())
      .filter(|ac| schema_matcher::matches(ac, schema))
      .and_then(|ac| TopologyEdge::for_attachment(uuid::Uuid::new_v4().to_string(), ac));

    self.edges.retain(|e| {
      !e.touches(id) || desired.as_ref().is_some_and(|d| e.same_wiring(d))
    });
    if let Some(edge) = desired
      && !self.edges.iter().any(|e| e.same_wiring(&edge))
    {
      debug!(edge = %edge.id, source = %edge.source, target = %edge.target, "edge added");
      self.edges.push(edge);
    }
  }

  fn remove(&mut self, id: &str) -> bool {
    let before = self.nodes.len();
    self.nodes.retain(|n| n.id != id);
    self.edges.retain(|e| !e.touches(id));
    self.nodes.len() != before
  }
}

/// Owner of the topology graph.
#[derive(Debug)]
pub struct TopologyStore {
  pub(crate) graph: Graph,
  schema: Option<ProgramSchema>,
  layout: LayoutEngine,
  dragging: HashSet<String>,
  read_only: bool,
  version: u64,
  publisher: watch::Sender<Arc<TopologySnapshot>>,
}

impl Default for TopologyStore {
  fn default() -> Self {
    Self::new(LayoutEngine::default())
  }
}

impl TopologyStore {
  /// Creates a store holding only the program node and both placeholders.
  pub fn new(layout: LayoutEngine) -> Self {
    let (publisher, _) = watch::channel(Arc::new(TopologySnapshot::default()));
    let mut store = Self {
      graph: Graph::seeded(),
      schema: None,
      layout,
      dragging: HashSet::new(),
      read_only: false,
      version: 0,
      publisher,
    };
    store.relayout();
    store
  }

  pub fn schema(&self) -> Option<&ProgramSchema> {
    self.schema.as_ref()
  }

  pub fn node(&self, id: &str) -> Option<&TopologyNode> {
    self.graph.node(id)
  }

  pub fn nodes(&self) -> &[TopologyNode] {
    &self.graph.nodes
  }

  pub fn edges(&self) -> &[TopologyEdge] {
    &self.graph.edges
  }

  pub fn is_read_only(&self) -> bool {
    self.read_only
  }

  /// Locks or unlocks user edits (attach, detach, relink).
  ///
  /// Typically driven by [`PipelineStatus::allows_topology_edits`](crate::types::PipelineStatus::allows_topology_edits).
  pub fn set_read_only(&mut self, read_only: bool) {
    if self.read_only != read_only {
      debug!(read_only, "topology edit lock changed");
      self.read_only = read_only;
    }
  }

  /// Attaches a connector to the pipeline.
  ///
  /// No-op if a node with the attachment's name already exists. An edge is
  /// added only if the relation exists in the current schema; otherwise the
  /// connector is kept unwired.
  #[instrument(level = "trace", skip(self, connector, attached), fields(connector = %attached.name))]
  pub fn attach(
    &mut self,
    connector: ConnectorDescriptor,
    attached: AttachedConnector,
  ) -> Result<(), TopologyError> {
    self.ensure_editable("attach")?;
    if is_protected_id(&attached.name) {
      return Err(TopologyError::InvalidOperation(format!(
        "connector name '{}' is reserved",
        attached.name
      )));
    }
    if self.graph.contains(&attached.name) {
      debug!(connector = %attached.name, "connector already attached");
      return Ok(());
    }
    let name = attached.name.clone();
    let offset = self.layout.config().row_height;
    self
      .graph
      .insert_connector(connector, attached, self.schema.as_ref(), offset)?;
    debug!(connector = %name, "connector attached");
    self.relayout();
    Ok(())
  }

  /// Removes a connector node and every edge touching it.
  ///
  /// No-op if the node does not exist. The program node and placeholders
  /// cannot be removed.
  #[instrument(level = "trace", skip(self))]
  pub fn detach(&mut self, node_id: &str) -> Result<(), TopologyError> {
    self.ensure_editable("detach")?;
    if is_protected_id(node_id) {
      return Err(TopologyError::InvalidOperation(format!(
        "node '{node_id}' cannot be removed"
      )));
    }
    if !self.graph.remove(node_id) {
      debug!(node_id, "detach of unknown node ignored");
      return Ok(());
    }
    self.dragging.remove(node_id);
    debug!(node_id, "connector detached");
    self.relayout();
    Ok(())
  }

  /// Points an attached connector at another relation (or none, with `""`).
  ///
  /// The old edge is dropped; a new one is added if the new relation matches.
  #[instrument(level = "trace", skip(self))]
  pub fn relink(&mut self, node_id: &str, new_relation_name: &str) -> Result<(), TopologyError> {
    self.ensure_editable("relink")?;
    let node = self
      .graph
      .node(node_id)
      .ok_or_else(|| TopologyError::InvalidOperation(format!("no node '{node_id}' to relink")))?;
    let Some(attached) = node.attached() else {
      return Err(TopologyError::InvalidOperation(format!(
        "node '{node_id}' is not a connector"
      )));
    };
    let mut updated = attached.clone();
    updated.relation_name = new_relation_name.to_string();
    if schema_matcher::matches(&updated, self.schema.as_ref()) {
      self.graph.require_program()?;
    }

    if let Some(TopologyNode {
      kind: NodeKind::Connector { attached, .. },
      ..
    }) = self.graph.node_mut(node_id)
    {
      attached.relation_name = new_relation_name.to_string();
    }
    self.graph.rewire(node_id, self.schema.as_ref());
    debug!(node_id, relation = new_relation_name, "connector relinked");
    self.relayout();
    Ok(())
  }

  /// Rebuilds the whole graph from persisted attachments.
  ///
  /// Replaces the current state. Attachments whose connector descriptor is
  /// unknown, or whose name is reserved or repeated, are skipped and logged.
  #[instrument(level = "trace", skip_all, fields(attachments = attached_connectors.len()))]
  pub fn hydrate(
    &mut self,
    schema: Option<ProgramSchema>,
    attached_connectors: &[AttachedConnector],
    connector_descriptors: &[ConnectorDescriptor],
  ) -> Result<(), TopologyError> {
    let mut graph = Graph::seeded();
    let offset = self.layout.config().row_height;
    for ac in attached_connectors {
      if is_protected_id(&ac.name) {
        warn!(connector = %ac.name, "skipping attachment with reserved name");
        continue;
      }
      if graph.contains(&ac.name) {
        warn!(connector = %ac.name, "skipping duplicate attachment");
        continue;
      }
      let Some(descriptor) = connector_descriptors
        .iter()
        .find(|d| d.connector_id == ac.connector_id)
      else {
        warn!(connector = %ac.name, connector_id = %ac.connector_id, "skipping attachment of unknown connector");
        continue;
      };
      graph.insert_connector(descriptor.clone(), ac.clone(), schema.as_ref(), offset)?;
    }

    self.graph = graph;
    self.schema = schema;
    self.dragging.clear();
    debug!(
      nodes = self.graph.nodes.len(),
      edges = self.graph.edges.len(),
      "topology hydrated"
    );
    self.relayout();
    Ok(())
  }

  /// Installs a recompiled program schema and re-derives every edge.
  #[instrument(level = "trace", skip_all)]
  pub fn set_schema(&mut self, schema: Option<ProgramSchema>) {
    self.schema = schema;
    let ids: Vec<String> = self
      .graph
      .nodes
      .iter()
      .filter(|n| n.attached().is_some())
      .map(|n| n.id.clone())
      .collect();
    for id in &ids {
      self.graph.rewire(id, self.schema.as_ref());
    }
    debug!(edges = self.graph.edges.len(), "schema replaced");
    self.relayout();
  }

  /// Attachments in insertion order, as they should be persisted.
  pub fn attached_connectors(&self) -> Vec<AttachedConnector> {
    self
      .graph
      .nodes
      .iter()
      .filter_map(|n| n.attached().cloned())
      .collect()
  }

  /// Marks a node as held by the pointer; layout leaves it alone.
  pub fn begin_drag(&mut self, node_id: &str) {
    if self.graph.contains(node_id) {
      self.dragging.insert(node_id.to_string());
    }
  }

  /// Moves a node to wherever the renderer says it is.
  pub fn drag_to(&mut self, node_id: &str, position: Position) {
    if let Some(node) = self.graph.node_mut(node_id) {
      node.position = position;
      self.publish();
    }
  }

  /// Releases a dragged node and lays the graph out again.
  pub fn end_drag(&mut self, node_id: &str) {
    if self.dragging.remove(node_id) {
      self.relayout();
    }
  }

  pub fn is_dragging(&self, node_id: &str) -> bool {
    self.dragging.contains(node_id)
  }

  /// Recomputes positions and publishes a new snapshot.
  pub fn relayout(&mut self) {
    self.layout.apply(&mut self.graph.nodes, &self.dragging);
    self.publish();
  }

  /// The latest published snapshot.
  pub fn snapshot(&self) -> Arc<TopologySnapshot> {
    self.publisher.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<Arc<TopologySnapshot>> {
    self.publisher.subscribe()
  }

  /// Stream of snapshots, starting with the current one.
  pub fn updates(&self) -> WatchStream<Arc<TopologySnapshot>> {
    WatchStream::new(self.subscribe())
  }

  fn ensure_editable(&self, op: &str) -> Result<(), TopologyError> {
    if self.read_only {
      Err(TopologyError::InvalidOperation(format!(
        "cannot {op} while the pipeline is deployed"
      )))
    } else {
      Ok(())
    }
  }

  fn publish(&mut self) {
    self.version += 1;
    let snapshot = TopologySnapshot {
      version: self.version,
      nodes: self.graph.nodes.clone(),
      edges: self.graph.edges.clone(),
    };
    self.publisher.send_replace(Arc::new(snapshot));
  }
}
