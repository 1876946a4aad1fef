//! Pipeline lifecycle: commands, optimistic status, and polling.
//!
//! [`Reconciler`] issues start/pause/shutdown against a [`PipelineBackend`],
//! records an optimistic status in the [`StatusRegister`] right away, and lets
//! polled backend status overwrite it later.

mod backend;
pub mod memory;
mod notification;
mod poller;
#[cfg(test)]
mod poller_test;
mod reconciler;
mod status_register;
pub mod transitions;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use backend::{CacheKey, NotificationSink, PipelineBackend, QueryCache};
pub use notification::{Notification, Severity};
pub use poller::PollHandle;
pub use reconciler::{CommandOutcome, MIN_POLL_INTERVAL, Reconciler};
pub use status_register::{CommandTicket, StatusRegister, StatusView};
pub use transitions::LifecycleCommand;

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// Every critical section in this module writes whole values, so the data
/// behind a poisoned lock is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
