//! Collaborators the reconciler talks to.

use std::fmt;

use async_trait::async_trait;

use super::Notification;
use crate::error::CommandError;
use crate::types::{BackendPipelineStatus, PipelineId, UpdatePipelineRequest};

/// Pipeline service. Every call is one request/response round trip.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
  async fn start_pipeline(&self, id: &PipelineId) -> Result<(), CommandError>;

  async fn pause_pipeline(&self, id: &PipelineId) -> Result<(), CommandError>;

  async fn shutdown_pipeline(&self, id: &PipelineId) -> Result<(), CommandError>;

  /// Authoritative status, fetched by the poller.
  async fn pipeline_status(&self, id: &PipelineId) -> Result<BackendPipelineStatus, CommandError>;

  async fn update_pipeline(
    &self,
    id: &PipelineId,
    request: &UpdatePipelineRequest,
  ) -> Result<(), CommandError>;
}

/// Cached reads that a mutation makes stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
  Pipeline(PipelineId),
  PipelineStatus(PipelineId),
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CacheKey::Pipeline(id) => write!(f, "pipeline/{id}"),
      CacheKey::PipelineStatus(id) => write!(f, "pipelineStatus/{id}"),
    }
  }
}

/// Data-fetch layer holding cached backend reads.
pub trait QueryCache: Send + Sync {
  /// Forces the next read of `key` to go to the backend.
  fn invalidate(&self, key: &CacheKey);
}

/// Where user-visible messages go.
pub trait NotificationSink: Send + Sync {
  fn push(&self, notification: Notification);
}
