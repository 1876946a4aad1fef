//! Program and pipeline descriptors exchanged with the backend service.

use serde::{Deserialize, Serialize};

use super::{AttachedConnector, PipelineId, ProgramSchema};

/// Compilation state of a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
  #[default]
  None,
  Pending,
  CompilingSql,
  CompilingRust,
  Success,
  SqlError,
  RustError,
  SystemError,
}

/// A SQL program and, once compiled, its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDescr {
  pub program_id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub schema: Option<ProgramSchema>,
  #[serde(default)]
  pub status: ProgramStatus,
  #[serde(default)]
  pub version: u64,
}

/// A pipeline as persisted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescr {
  pub pipeline_id: PipelineId,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub program_id: Option<String>,
  #[serde(default)]
  pub attached_connectors: Vec<AttachedConnector>,
  #[serde(default)]
  pub version: u64,
}

/// Request to update an existing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePipelineRequest {
  pub name: String,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub program_id: Option<String>,
  /// `None` keeps the existing connectors; `Some` replaces them all.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connectors: Option<Vec<AttachedConnector>>,
}

impl UpdatePipelineRequest {
  /// Request that keeps `descr` as is but replaces its connectors.
  pub fn replace_connectors(descr: &PipelineDescr, connectors: Vec<AttachedConnector>) -> Self {
    Self {
      name: descr.name.clone(),
      description: descr.description.clone(),
      program_id: descr.program_id.clone(),
      connectors: Some(connectors),
    }
  }

  pub fn replaces_connectors(&self) -> bool {
    self.connectors.is_some()
  }
}
