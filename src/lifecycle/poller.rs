//! Periodic status polling for one pipeline.

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, instrument, warn};

use super::Reconciler;
use crate::types::PipelineId;

/// Owner of a running poll loop.
///
/// Closing or dropping the handle stops the loop. When it was the last view of
/// the pipeline, the pipeline is forgotten too, so a poll or command answer
/// that is still on its way is discarded.
pub struct PollHandle {
  id: PipelineId,
  generation: u64,
  reconciler: Reconciler,
  task: Option<JoinHandle<()>>,
}

impl Reconciler {
  /// Tracks `id` and polls its backend status every poll interval, starting now.
  #[instrument(level = "trace", skip(self), fields(pipeline = %id))]
  pub fn watch(&self, id: PipelineId) -> PollHandle {
    let generation = self.register().watch(&id);
    let reconciler = self.clone();
    let poll_id = id.clone();
    let task = tokio::spawn(async move {
      let mut ticker = time::interval(reconciler.poll_interval());
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        match reconciler.poll_once(&poll_id).await {
          Ok(Some(_)) => {}
          Ok(None) => {
            debug!(pipeline = %poll_id, "pipeline no longer tracked; poll loop exiting");
            break;
          }
          Err(e) => warn!(pipeline = %poll_id, error = %e, "status poll failed"),
        }
      }
    });
    PollHandle {
      id,
      generation,
      reconciler: self.clone(),
      task: Some(task),
    }
  }
}

impl PollHandle {
  pub fn pipeline_id(&self) -> &PipelineId {
    &self.id
  }

  pub fn is_finished(&self) -> bool {
    self.task.as_ref().is_none_or(|t| t.is_finished())
  }

  /// Stops polling; forgets the pipeline if no other view watches it.
  pub fn close(mut self) {
    self.stop();
  }

  fn stop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
      let forgotten = self.reconciler.register().unwatch(&self.id, self.generation);
      debug!(pipeline = %self.id, forgotten, "polling stopped");
    }
  }
}

impl Drop for PollHandle {
  fn drop(&mut self) {
    self.stop();
  }
}
