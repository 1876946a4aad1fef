//! In-process collaborators: a scripted backend, a recording cache and a
//! recording notification sink. Useful for demos and tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CacheKey, LifecycleCommand, Notification, NotificationSink, PipelineBackend, QueryCache, lock};
use crate::error::CommandError;
use crate::types::{BackendPipelineStatus, PipelineId, UpdatePipelineRequest};

#[derive(Debug, Default)]
struct BackendState {
  statuses: HashMap<PipelineId, BackendPipelineStatus>,
  commands: Vec<(LifecycleCommand, PipelineId)>,
  updates: Vec<(PipelineId, UpdatePipelineRequest)>,
  command_failures: VecDeque<CommandError>,
  status_failures: VecDeque<CommandError>,
  status_polls: usize,
}

/// Backend that applies commands to an in-memory status table.
///
/// A successful start moves the pipeline to `Running`, pause to `Paused`,
/// shutdown to `Shutdown`. Failures can be queued up front.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
  state: Mutex<BackendState>,
  latency: Duration,
}

impl InMemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every command and poll sleeps this long before answering.
  pub fn with_latency(latency: Duration) -> Self {
    Self {
      state: Mutex::default(),
      latency,
    }
  }

  pub fn set_status(&self, id: &PipelineId, status: BackendPipelineStatus) {
    lock(&self.state).statuses.insert(id.clone(), status);
  }

  pub fn backend_status(&self, id: &PipelineId) -> BackendPipelineStatus {
    lock(&self.state)
      .statuses
      .get(id)
      .copied()
      .unwrap_or(BackendPipelineStatus::Shutdown)
  }

  /// The next lifecycle command fails with `error`.
  pub fn fail_next_command(&self, error: CommandError) {
    lock(&self.state).command_failures.push_back(error);
  }

  /// The next status poll fails with `error`.
  pub fn fail_next_poll(&self, error: CommandError) {
    lock(&self.state).status_failures.push_back(error);
  }

  /// Commands received so far, in order.
  pub fn commands(&self) -> Vec<(LifecycleCommand, PipelineId)> {
    lock(&self.state).commands.clone()
  }

  pub fn updates(&self) -> Vec<(PipelineId, UpdatePipelineRequest)> {
    lock(&self.state).updates.clone()
  }

  pub fn status_polls(&self) -> usize {
    lock(&self.state).status_polls
  }

  async fn delay(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }

  async fn command(&self, command: LifecycleCommand, id: &PipelineId) -> Result<(), CommandError> {
    lock(&self.state).commands.push((command, id.clone()));
    self.delay().await;
    let mut state = lock(&self.state);
    if let Some(error) = state.command_failures.pop_front() {
      return Err(error);
    }
    let status = match command {
      LifecycleCommand::Start => BackendPipelineStatus::Running,
      LifecycleCommand::Pause => BackendPipelineStatus::Paused,
      LifecycleCommand::Shutdown => BackendPipelineStatus::Shutdown,
    };
    debug!(pipeline = %id, %command, ?status, "in-memory backend applied command");
    state.statuses.insert(id.clone(), status);
    Ok(())
  }
}

#[async_trait]
impl PipelineBackend for InMemoryBackend {
  async fn start_pipeline(&self, id: &PipelineId) -> Result<(), CommandError> {
    self.command(LifecycleCommand::Start, id).await
  }

  async fn pause_pipeline(&self, id: &PipelineId) -> Result<(), CommandError> {
    self.command(LifecycleCommand::Pause, id).await
  }

  async fn shutdown_pipeline(&self, id: &PipelineId) -> Result<(), CommandError> {
    self.command(LifecycleCommand::Shutdown, id).await
  }

  async fn pipeline_status(&self, id: &PipelineId) -> Result<BackendPipelineStatus, CommandError> {
    self.delay().await;
    let mut state = lock(&self.state);
    state.status_polls += 1;
    if let Some(error) = state.status_failures.pop_front() {
      return Err(error);
    }
    Ok(
      state
        .statuses
        .get(id)
        .copied()
        .unwrap_or(BackendPipelineStatus::Shutdown),
    )
  }

  async fn update_pipeline(
    &self,
    id: &PipelineId,
    request: &UpdatePipelineRequest,
  ) -> Result<(), CommandError> {
    self.delay().await;
    let mut state = lock(&self.state);
    if let Some(error) = state.command_failures.pop_front() {
      return Err(error);
    }
    state.updates.push((id.clone(), request.clone()));
    Ok(())
  }
}

/// Cache that only remembers which keys were invalidated.
#[derive(Debug, Default)]
pub struct RecordingCache {
  invalidated: Mutex<Vec<CacheKey>>,
}

impl RecordingCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn invalidated(&self) -> Vec<CacheKey> {
    lock(&self.invalidated).clone()
  }
}

impl QueryCache for RecordingCache {
  fn invalidate(&self, key: &CacheKey) {
    lock(&self.invalidated).push(key.clone());
  }
}

/// Sink that keeps every notification pushed to it.
#[derive(Debug, Default)]
pub struct RecordingNotifications {
  pushed: Mutex<Vec<Notification>>,
}

impl RecordingNotifications {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pushed(&self) -> Vec<Notification> {
    lock(&self.pushed).clone()
  }
}

impl NotificationSink for RecordingNotifications {
  fn push(&self, notification: Notification) {
    lock(&self.pushed).push(notification);
  }
}
