//! Tests for `Reconciler::watch` and `PollHandle`.

use std::sync::Arc;
use std::time::Duration;

use super::Reconciler;
use super::memory::{InMemoryBackend, RecordingCache, RecordingNotifications};
use crate::error::CommandError;
use crate::types::{BackendPipelineStatus, PipelineId, PipelineStatus};

fn setup() -> (Reconciler, Arc<InMemoryBackend>) {
  let backend = Arc::new(InMemoryBackend::new());
  let reconciler = Reconciler::with_poll_interval(
    backend.clone(),
    Arc::new(RecordingCache::new()),
    Arc::new(RecordingNotifications::new()),
    Duration::from_secs(1),
  );
  (reconciler, backend)
}

fn id() -> PipelineId {
  PipelineId::from("p1")
}

#[tokio::test(start_paused = true)]
async fn polls_immediately_and_periodically_until_closed() {
  let (reconciler, backend) = setup();
  backend.set_status(&id(), BackendPipelineStatus::Running);
  let handle = reconciler.watch(id());
  tokio::time::sleep(Duration::from_millis(10)).await;
  assert_eq!(reconciler.status(&id()), Some(PipelineStatus::Running));

  tokio::time::sleep(Duration::from_secs(3)).await;
  let polls = backend.status_polls();
  assert!(polls >= 3, "expected periodic polls, got {polls}");

  handle.close();
  assert_eq!(reconciler.status(&id()), None);
  tokio::time::sleep(Duration::from_secs(5)).await;
  assert_eq!(backend.status_polls(), polls);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_does_not_stop_the_loop() {
  let (reconciler, backend) = setup();
  backend.fail_next_poll(CommandError::TransportFailure("down".to_string()));
  backend.set_status(&id(), BackendPipelineStatus::Paused);
  let _handle = reconciler.watch(id());
  tokio::time::sleep(Duration::from_millis(10)).await;
  assert_eq!(reconciler.status(&id()), Some(PipelineStatus::Shutdown));
  tokio::time::sleep(Duration::from_secs(1)).await;
  assert_eq!(reconciler.status(&id()), Some(PipelineStatus::Paused));
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_forgets_pipeline() {
  let (reconciler, _backend) = setup();
  {
    let handle = reconciler.watch(id());
    assert_eq!(handle.pipeline_id(), &id());
    assert_eq!(reconciler.status(&id()), Some(PipelineStatus::Shutdown));
  }
  assert_eq!(reconciler.status(&id()), None);
}

#[tokio::test(start_paused = true)]
async fn loop_exits_once_pipeline_is_forgotten() {
  let (reconciler, _backend) = setup();
  let handle = reconciler.watch(id());
  tokio::time::sleep(Duration::from_millis(10)).await;
  reconciler.forget(&id());
  tokio::time::sleep(Duration::from_secs(2)).await;
  assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn closing_one_of_two_views_keeps_the_other_polling() {
  let (reconciler, backend) = setup();
  backend.set_status(&id(), BackendPipelineStatus::Running);
  let first = reconciler.watch(id());
  let second = reconciler.watch(id());
  tokio::time::sleep(Duration::from_millis(10)).await;

  first.close();
  assert_eq!(reconciler.status(&id()), Some(PipelineStatus::Running));
  let polls = backend.status_polls();
  backend.set_status(&id(), BackendPipelineStatus::Paused);
  tokio::time::sleep(Duration::from_secs(3)).await;
  assert!(!second.is_finished());
  assert!(backend.status_polls() > polls);
  assert_eq!(reconciler.status(&id()), Some(PipelineStatus::Paused));

  second.close();
  assert_eq!(reconciler.status(&id()), None);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_clamped_and_polls() {
  let backend = Arc::new(InMemoryBackend::new());
  let reconciler = Reconciler::with_poll_interval(
    backend.clone(),
    Arc::new(RecordingCache::new()),
    Arc::new(RecordingNotifications::new()),
    Duration::ZERO,
  );
  assert_eq!(reconciler.poll_interval(), super::MIN_POLL_INTERVAL);
  let handle = reconciler.watch(id());
  tokio::time::sleep(Duration::from_millis(10)).await;
  assert!(!handle.is_finished());
  assert!(backend.status_polls() >= 2);
}
