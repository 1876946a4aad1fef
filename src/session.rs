//! A saved editing session: program, pipeline and the connectors it may use.
//!
//! Used by `render_topology` to hydrate a store from disk and replay edits.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::SessionError;
use crate::topology_store::TopologyStore;
use crate::types::{
  AttachedConnector, ConnectorDescriptor, PipelineDescr, ProgramDescr, UpdatePipelineRequest,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub program: ProgramDescr,
  pub pipeline: PipelineDescr,
  #[serde(default)]
  pub connectors: Vec<ConnectorDescriptor>,
}

/// One user edit, written `attach:<name>:<connector_id>:<in|out>[:<relation>]`,
/// `detach:<name>` or `relink:<name>[:<relation>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
  Attach(AttachedConnector),
  Detach(String),
  Relink { node: String, relation: String },
}

impl FromStr for Edit {
  type Err = SessionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bad = || SessionError::InvalidEdit(s.to_string());
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
      ["attach", name, connector_id, side, rest @ ..] if rest.len() <= 1 => {
        let is_input = match *side {
          "in" => true,
          "out" => false,
          _ => return Err(bad()),
        };
        Ok(Edit::Attach(AttachedConnector {
          name: name.to_string(),
          connector_id: connector_id.to_string(),
          relation_name: rest.first().map(|r| r.to_string()).unwrap_or_default(),
          is_input,
        }))
      }
      ["detach", name] => Ok(Edit::Detach(name.to_string())),
      ["relink", node, rest @ ..] if rest.len() <= 1 => Ok(Edit::Relink {
        node: node.to_string(),
        relation: rest.first().map(|r| r.to_string()).unwrap_or_default(),
      }),
      _ => Err(bad()),
    }
  }
}

impl Session {
  #[instrument(level = "trace")]
  pub fn load(path: &Path) -> Result<Self, SessionError> {
    let bytes = std::fs::read(path)?;
    let session: Self = serde_json::from_slice(&bytes)?;
    info!(
      pipeline = %session.pipeline.pipeline_id,
      attachments = session.pipeline.attached_connectors.len(),
      "session loaded"
    );
    Ok(session)
  }

  /// Rebuilds `store` from the pipeline's persisted attachments.
  pub fn hydrate(&self, store: &mut TopologyStore) -> Result<(), SessionError> {
    store.hydrate(
      self.program.schema.clone(),
      &self.pipeline.attached_connectors,
      &self.connectors,
    )?;
    Ok(())
  }

  pub fn apply(&self, store: &mut TopologyStore, edit: &Edit) -> Result<(), SessionError> {
    match edit {
      Edit::Attach(attached) => {
        let descriptor = self
          .connectors
          .iter()
          .find(|c| c.connector_id == attached.connector_id)
          .ok_or_else(|| SessionError::InvalidEdit(format!("unknown connector '{}'", attached.connector_id)))?;
        store.attach(descriptor.clone(), attached.clone())?;
      }
      Edit::Detach(node) => store.detach(node)?,
      Edit::Relink { node, relation } => store.relink(node, relation)?,
    }
    Ok(())
  }

  /// Request persisting the store's attachments for this pipeline.
  pub fn update_request(&self, store: &TopologyStore) -> UpdatePipelineRequest {
    UpdatePipelineRequest::replace_connectors(&self.pipeline, store.attached_connectors())
  }
}
