//! Per-pipeline lifecycle status, keyed by pipeline id.
//!
//! An entry is created the first time a pipeline is observed. It is removed
//! when it is forgotten, or when the last view watching it goes away. Each
//! entry carries a generation; results that come back for an older generation
//! are dropped, so a closed view is never written to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use super::lock;
use crate::types::{PipelineId, PipelineStatus};

/// Immutable copy of every known pipeline's status.
pub type StatusView = HashMap<PipelineId, PipelineStatus>;

#[derive(Debug, Clone, Copy)]
struct Entry {
  status: PipelineStatus,
  in_flight: bool,
  generation: u64,
  /// Open views polling this pipeline.
  watchers: usize,
}

#[derive(Debug, Default)]
struct Entries {
  by_id: HashMap<PipelineId, Entry>,
  next_generation: u64,
}

impl Entries {
  fn observe(&mut self, id: &PipelineId) -> &mut Entry {
    let next = &mut self.next_generation;
    self.by_id.entry(id.clone()).or_insert_with(|| {
      *next += 1;
      Entry {
        status: PipelineStatus::default(),
        in_flight: false,
        generation: *next,
        watchers: 0,
      }
    })
  }

  fn current(&mut self, id: &PipelineId, generation: u64) -> Option<&mut Entry> {
    self
      .by_id
      .get_mut(id)
      .filter(|e| e.generation == generation)
  }

  fn view(&self) -> StatusView {
    self
      .by_id
      .iter()
      .map(|(id, e)| (id.clone(), e.status))
      .collect()
  }
}

/// Proof that a command was admitted; needed to record its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTicket {
  pub generation: u64,
  /// Status before the optimistic update.
  pub prior: PipelineStatus,
  /// Status stored when the command was admitted.
  pub optimistic: PipelineStatus,
}

/// Keyed status registry, written only by the reconciler.
#[derive(Debug)]
pub struct StatusRegister {
  entries: Mutex<Entries>,
  publisher: watch::Sender<Arc<StatusView>>,
}

impl Default for StatusRegister {
  fn default() -> Self {
    let (publisher, _) = watch::channel(Arc::new(StatusView::new()));
    Self {
      entries: Mutex::new(Entries::default()),
      publisher,
    }
  }
}

impl StatusRegister {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts tracking `id` (as `Shutdown`) if it is not tracked yet.
  /// Returns the entry's generation.
  pub fn observe(&self, id: &PipelineId) -> u64 {
    let mut entries = lock(&self.entries);
    let created = !entries.by_id.contains_key(id);
    let generation = entries.observe(id).generation;
    if created {
      debug!(pipeline = %id, generation, "pipeline observed");
      self.publish(&entries);
    }
    generation
  }

  /// Registers one more view watching `id`, tracking it if needed.
  /// Returns the entry's generation.
  pub fn watch(&self, id: &PipelineId) -> u64 {
    let mut entries = lock(&self.entries);
    let created = !entries.by_id.contains_key(id);
    let entry = entries.observe(id);
    entry.watchers += 1;
    let (generation, watchers) = (entry.generation, entry.watchers);
    debug!(pipeline = %id, generation, watchers, "view watching pipeline");
    if created {
      self.publish(&entries);
    }
    generation
  }

  /// Releases one view of `id` registered under `generation`.
  ///
  /// The entry is forgotten once no view is left. Returns true if it was.
  pub fn unwatch(&self, id: &PipelineId, generation: u64) -> bool {
    let mut entries = lock(&self.entries);
    let Some(entry) = entries.current(id, generation) else {
      return false;
    };
    entry.watchers = entry.watchers.saturating_sub(1);
    if entry.watchers > 0 {
      debug!(pipeline = %id, watchers = entry.watchers, "view closed; pipeline still watched");
      return false;
    }
    entries.by_id.remove(id);
    debug!(pipeline = %id, "last view closed; pipeline forgotten");
    self.publish(&entries);
    true
  }

  pub fn watchers(&self, id: &PipelineId) -> usize {
    lock(&self.entries).by_id.get(id).map_or(0, |e| e.watchers)
  }

  /// Stops tracking `id` whoever watches it. Pending results for it are discarded.
  pub fn forget(&self, id: &PipelineId) -> bool {
    let mut entries = lock(&self.entries);
    let removed = entries.by_id.remove(id).is_some();
    if removed {
      debug!(pipeline = %id, "pipeline forgotten");
      self.publish(&entries);
    }
    removed
  }

  pub fn status(&self, id: &PipelineId) -> Option<PipelineStatus> {
    lock(&self.entries).by_id.get(id).map(|e| e.status)
  }

  pub fn generation(&self, id: &PipelineId) -> Option<u64> {
    lock(&self.entries).by_id.get(id).map(|e| e.generation)
  }

  pub fn is_in_flight(&self, id: &PipelineId) -> bool {
    lock(&self.entries)
      .by_id
      .get(id)
      .is_some_and(|e| e.in_flight)
  }

  pub fn any_in_flight(&self) -> bool {
    lock(&self.entries).by_id.values().any(|e| e.in_flight)
  }

  /// Admits a command for `id` unless one is already in flight.
  ///
  /// `next` maps the current status to the optimistic one, or `None` to
  /// refuse the command. On admission the optimistic status is stored and the
  /// entry is marked in flight.
  pub fn try_begin(
    &self,
    id: &PipelineId,
    next: impl FnOnce(PipelineStatus) -> Option<PipelineStatus>,
  ) -> Option<CommandTicket> {
    let mut entries = lock(&self.entries);
    let entry = entries.observe(id);
    if entry.in_flight {
      return None;
    }
    let prior = entry.status;
    let optimistic = next(prior)?;
    entry.status = optimistic;
    entry.in_flight = true;
    let ticket = CommandTicket {
      generation: entry.generation,
      prior,
      optimistic,
    };
    self.publish(&entries);
    Some(ticket)
  }

  /// Records the end of an admitted command.
  ///
  /// `status` replaces the optimistic one when set (failure path), unless a
  /// poll has replaced the optimistic status already. Returns false, changing
  /// nothing, if the entry was forgotten meanwhile.
  pub fn finish(
    &self,
    id: &PipelineId,
    ticket: CommandTicket,
    status: Option<PipelineStatus>,
  ) -> bool {
    let mut entries = lock(&self.entries);
    let Some(entry) = entries.current(id, ticket.generation) else {
      return false;
    };
    entry.in_flight = false;
    match status {
      Some(status) if entry.status == ticket.optimistic => entry.status = status,
      Some(status) => {
        debug!(pipeline = %id, polled = %entry.status, fallback = %status, "polled status kept over fallback")
      }
      None => {}
    }
    self.publish(&entries);
    true
  }

  /// Stores a polled status; it always wins over an optimistic guess.
  ///
  /// Returns false if `generation` is no longer current.
  pub fn apply_poll(&self, id: &PipelineId, generation: u64, status: PipelineStatus) -> bool {
    let mut entries = lock(&self.entries);
    let Some(entry) = entries.current(id, generation) else {
      return false;
    };
    if entry.status != status {
      debug!(pipeline = %id, from = %entry.status, to = %status, "polled status applied");
      entry.status = status;
      self.publish(&entries);
    }
    true
  }

  pub fn snapshot(&self) -> Arc<StatusView> {
    self.publisher.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<Arc<StatusView>> {
    self.publisher.subscribe()
  }

  pub fn updates(&self) -> WatchStream<Arc<StatusView>> {
    WatchStream::new(self.subscribe())
  }

  fn publish(&self, entries: &Entries) {
    self.publisher.send_replace(Arc::new(entries.view()));
  }
}
