//! Issues lifecycle commands and reconciles client status with the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::transitions::{self, LifecycleCommand};
use super::{
  CacheKey, Notification, NotificationSink, PipelineBackend, QueryCache, StatusRegister,
  StatusView,
};
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::CommandError;
use crate::types::{PipelineId, PipelineStatus, UpdatePipelineRequest};

/// Shortest interval the poller accepts.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What happened to a command request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
  /// Sent to the backend and accepted; the poller confirms the final status.
  Issued,
  /// Not sent: another command is in flight or the current status does not allow it.
  Suppressed,
  /// Sent, but the pipeline was forgotten before the answer came back.
  Discarded,
}

struct Shared {
  backend: Arc<dyn PipelineBackend>,
  cache: Arc<dyn QueryCache>,
  notifications: Arc<dyn NotificationSink>,
  register: StatusRegister,
  last_notification: AtomicU64,
  poll_interval: Duration,
}

/// Lifecycle reconciler. Cheap to clone; clones share one status register.
#[derive(Clone)]
pub struct Reconciler {
  shared: Arc<Shared>,
}

impl Reconciler {
  pub fn new(
    backend: Arc<dyn PipelineBackend>,
    cache: Arc<dyn QueryCache>,
    notifications: Arc<dyn NotificationSink>,
  ) -> Self {
    Self::with_poll_interval(backend, cache, notifications, DEFAULT_POLL_INTERVAL)
  }

  /// Like [`Reconciler::new`] with a custom poll interval. A zero interval is
  /// raised to [`MIN_POLL_INTERVAL`].
  pub fn with_poll_interval(
    backend: Arc<dyn PipelineBackend>,
    cache: Arc<dyn QueryCache>,
    notifications: Arc<dyn NotificationSink>,
    poll_interval: Duration,
  ) -> Self {
    if poll_interval < MIN_POLL_INTERVAL {
      warn!(?poll_interval, min = ?MIN_POLL_INTERVAL, "poll interval too short; clamping");
    }
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
    Self {
      shared: Arc::new(Shared {
        backend,
        cache,
        notifications,
        register: StatusRegister::new(),
        last_notification: AtomicU64::new(0),
        poll_interval,
      }),
    }
  }

  pub fn poll_interval(&self) -> Duration {
    self.shared.poll_interval
  }

  pub fn register(&self) -> &StatusRegister {
    &self.shared.register
  }

  pub fn status(&self, id: &PipelineId) -> Option<PipelineStatus> {
    self.shared.register.status(id)
  }

  pub fn statuses(&self) -> Arc<StatusView> {
    self.shared.register.snapshot()
  }

  pub fn subscribe(&self) -> watch::Receiver<Arc<StatusView>> {
    self.shared.register.subscribe()
  }

  /// True while a command for `id` awaits the backend. Command buttons use
  /// this to disable themselves.
  pub fn pipeline_action_loading(&self, id: &PipelineId) -> bool {
    self.shared.register.is_in_flight(id)
  }

  pub fn any_action_loading(&self) -> bool {
    self.shared.register.any_in_flight()
  }

  /// Whether the topology of `id` may be edited right now.
  pub fn edits_allowed(&self, id: &PipelineId) -> bool {
    self
      .status(id)
      .unwrap_or_default()
      .allows_topology_edits()
  }

  /// Stops tracking `id`, e.g. after the pipeline was deleted.
  pub fn forget(&self, id: &PipelineId) -> bool {
    self.shared.register.forget(id)
  }

  pub async fn start(&self, id: &PipelineId) -> Result<CommandOutcome, CommandError> {
    self.run(LifecycleCommand::Start, id).await
  }

  pub async fn pause(&self, id: &PipelineId) -> Result<CommandOutcome, CommandError> {
    self.run(LifecycleCommand::Pause, id).await
  }

  pub async fn shutdown(&self, id: &PipelineId) -> Result<CommandOutcome, CommandError> {
    self.run(LifecycleCommand::Shutdown, id).await
  }

  /// Issues `command` for `id`.
  ///
  /// The optimistic status is visible before the backend answers. On failure
  /// the status falls back per the transition table and the error is pushed
  /// to the notification sink. Failed commands are never retried.
  #[instrument(level = "trace", skip(self), fields(pipeline = %id))]
  pub async fn run(
    &self,
    command: LifecycleCommand,
    id: &PipelineId,
  ) -> Result<CommandOutcome, CommandError> {
    let shared = &self.shared;
    let Some(ticket) = shared
      .register
      .try_begin(id, |current| transitions::optimistic(current, command))
    else {
      warn!(pipeline = %id, %command, status = ?self.status(id), "command suppressed");
      return Ok(CommandOutcome::Suppressed);
    };
    info!(pipeline = %id, %command, "issuing lifecycle command");

    let result = match command {
      LifecycleCommand::Start => shared.backend.start_pipeline(id).await,
      LifecycleCommand::Pause => shared.backend.pause_pipeline(id).await,
      LifecycleCommand::Shutdown => shared.backend.shutdown_pipeline(id).await,
    };

    let fallback = result
      .as_ref()
      .err()
      .map(|_| transitions::on_failure(command, ticket.prior));
    if !shared.register.finish(id, ticket, fallback) {
      if let Err(e) = &result {
        warn!(pipeline = %id, %command, error = %e, "discarding result for closed pipeline");
      } else {
        debug!(pipeline = %id, %command, "discarding result for closed pipeline");
      }
      return Ok(CommandOutcome::Discarded);
    }
    self.invalidate(id);

    match result {
      Ok(()) => {
        debug!(pipeline = %id, %command, "command accepted; awaiting poll");
        Ok(CommandOutcome::Issued)
      }
      Err(e) => {
        warn!(pipeline = %id, %command, error = %e, "command failed");
        self.notify_error(&e);
        Err(e)
      }
    }
  }

  /// Saves a configuration change, e.g. a new set of attached connectors.
  ///
  /// Cached pipeline and status reads are invalidated whatever the outcome.
  #[instrument(level = "trace", skip(self, request), fields(pipeline = %id))]
  pub async fn update_pipeline(
    &self,
    id: &PipelineId,
    request: &UpdatePipelineRequest,
  ) -> Result<(), CommandError> {
    let result = self.shared.backend.update_pipeline(id, request).await;
    self.invalidate(id);
    if let Err(e) = &result {
      warn!(pipeline = %id, error = %e, "pipeline update failed");
      self.notify_error(e);
    }
    result
  }

  /// Fetches the backend status of `id` once and stores it.
  ///
  /// Returns `Ok(None)` if `id` is not tracked, or stopped being tracked
  /// while the request was out.
  #[instrument(level = "trace", skip(self), fields(pipeline = %id))]
  pub async fn poll_once(&self, id: &PipelineId) -> Result<Option<PipelineStatus>, CommandError> {
    let Some(generation) = self.shared.register.generation(id) else {
      return Ok(None);
    };
    let reported = self.shared.backend.pipeline_status(id).await?;
    let status = PipelineStatus::from(reported);
    if self.shared.register.apply_poll(id, generation, status) {
      Ok(Some(status))
    } else {
      debug!(pipeline = %id, "discarding poll for closed pipeline");
      Ok(None)
    }
  }

  fn invalidate(&self, id: &PipelineId) {
    self
      .shared
      .cache
      .invalidate(&CacheKey::Pipeline(id.clone()));
    self
      .shared
      .cache
      .invalidate(&CacheKey::PipelineStatus(id.clone()));
  }

  fn notify_error(&self, error: &CommandError) {
    let id = self.shared.last_notification.fetch_add(1, Ordering::Relaxed) + 1;
    self
      .shared
      .notifications
      .push(Notification::error(id, error.user_message()));
  }
}
