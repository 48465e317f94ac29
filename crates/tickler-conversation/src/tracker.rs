use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use tickler_core::UserId;

use crate::state::ConversationState;

type Cell = Arc<Mutex<ConversationState>>;

/// One [`ConversationState`] per user.
///
/// Each user's state sits behind its own async mutex. Holding the guard from
/// [`lock`](Self::lock) for the whole handling of an inbound event serializes
/// that user's events; different users never contend. Only users with a
/// pending flow (or an event in flight) keep an entry: an `Idle` state is the
/// same as no entry, and is evicted when its guard drops.
#[derive(Default)]
pub struct ConversationTracker {
    states: DashMap<UserId, Cell>,
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `user`'s state, creating an `Idle` entry on first contact.
    pub async fn lock(&self, user: UserId) -> ConversationGuard<'_> {
        // Clone the Arc out so no map shard lock is held across the await.
        let cell = Arc::clone(
            self.states
                .entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(ConversationState::Idle)))
                .value(),
        );
        let guard = Arc::clone(&cell).lock_owned().await;
        ConversationGuard {
            guard,
            cell,
            user,
            states: &self.states,
        }
    }

    /// Snapshot of `user`'s state. Waits for any in-flight event of that user.
    pub async fn current(&self, user: UserId) -> ConversationState {
        let cell = match self.states.get(&user) {
            Some(cell) => Arc::clone(cell.value()),
            None => return ConversationState::Idle,
        };
        let state = cell.lock().await;
        state.clone()
    }

    /// Number of users with a live entry.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Exclusive access to one user's state for the duration of an event.
///
/// On drop an `Idle` entry is removed from the tracker unless another task
/// already holds a handle to it.
pub struct ConversationGuard<'a> {
    guard: OwnedMutexGuard<ConversationState>,
    cell: Cell,
    user: UserId,
    states: &'a DashMap<UserId, Cell>,
}

impl Deref for ConversationGuard<'_> {
    type Target = ConversationState;

    fn deref(&self) -> &ConversationState {
        &self.guard
    }
}

impl DerefMut for ConversationGuard<'_> {
    fn deref_mut(&mut self) -> &mut ConversationState {
        &mut self.guard
    }
}

impl Drop for ConversationGuard<'_> {
    fn drop(&mut self) {
        if !self.guard.is_idle() {
            return;
        }
        // Still locked here, so the state cannot change. Three strong refs are
        // the map, `self.cell` and the guard itself: no other task is waiting
        // on or reading this cell, and `remove_if` holds the shard lock that
        // new handles are cloned under.
        self.states.remove_if(&self.user, |_, cell| {
            Arc::ptr_eq(cell, &self.cell) && Arc::strong_count(cell) == 3
        });
    }
}
