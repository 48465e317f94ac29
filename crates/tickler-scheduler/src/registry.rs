//! In-memory map from reminder id to its armed jobs.
//!
//! The registry is the only authority on "is this reminder armed". Arming is a
//! check-and-insert under the DashMap shard lock, so two scans racing on the
//! same id produce exactly one entry.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use tickler_core::ReminderId;

/// The two tasks backing one armed reminder.
///
/// Dropping the entry aborts both tasks, which stops every future follow-up.
pub struct ArmedJob {
    generation: u64,
    initial: JoinHandle<()>,
    follow_up: JoinHandle<()>,
}

impl Drop for ArmedJob {
    fn drop(&mut self) {
        self.initial.abort();
        self.follow_up.abort();
    }
}

/// Concurrent job registry keyed by reminder id.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<ReminderId, ArmedJob>,
    next_generation: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self, id: ReminderId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Arm `id` unless it already has an entry.
    ///
    /// `spawn` receives the generation number of the new entry and returns the
    /// `(initial, follow_up)` task handles. It is only called when the id is
    /// vacant. Returns `true` when a new entry was inserted.
    pub fn arm<F>(&self, id: ReminderId, spawn: F) -> bool
    where
        F: FnOnce(u64) -> (JoinHandle<()>, JoinHandle<()>),
    {
        match self.jobs.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let (initial, follow_up) = spawn(generation);
                slot.insert(ArmedJob {
                    generation,
                    initial,
                    follow_up,
                });
                true
            }
        }
    }

    /// Cancel both tasks for `id` and drop the entry. No-op when not armed.
    pub fn disarm(&self, id: ReminderId) -> bool {
        self.jobs.remove(&id).is_some()
    }

    /// Disarm `id` only if its entry still belongs to `generation`.
    ///
    /// Used by a job to clean up after itself without removing an entry that a
    /// later scan armed for the same id.
    pub fn disarm_generation(&self, id: ReminderId, generation: u64) -> bool {
        self.jobs
            .remove_if(&id, |_, job| job.generation == generation)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Disarm everything (shutdown).
    pub fn clear(&self) {
        self.jobs.clear();
    }
}
