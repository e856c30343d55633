//! Instance pool with blocking acquire and notifying release.
//!
//! Every piece of instance state (active flags, counters and the free queue)
//! sits behind one mutex, so an acquire, a release and a snapshot each see the
//! free queue and the active flags change together. Parties waiting for an
//! instance park on a [`Notify`] that is signalled once per returned instance.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::Notify;

use super::slot::{InstanceId, InstanceSlot, InstanceStats, InstanceStatus};

struct PoolState {
    slots: Vec<InstanceSlot>,
    free: VecDeque<InstanceId>,
}

impl PoolState {
    fn take_free(&mut self) -> Option<InstanceId> {
        let id = self.free.pop_front()?;
        self.slots[id.index()].occupy();
        Some(id)
    }

    fn give_back(&mut self, id: InstanceId, run_time: Option<u32>) {
        let slot = &mut self.slots[id.index()];
        match run_time {
            Some(run_time) => slot.complete(run_time),
            None => slot.abandon(),
        }
        self.free.push_back(id);
    }
}

/// Point-in-time view of pool occupancy, taken under the pool lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Every instance in id order.
    pub instances: Vec<InstanceStatus>,
    /// Ids waiting in the free queue, front first.
    pub free: Vec<InstanceId>,
}

impl PoolSnapshot {
    pub fn capacity(&self) -> usize {
        self.instances.len()
    }

    pub fn active(&self) -> usize {
        self.instances.iter().filter(|s| s.active).count()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// All instances are occupied; new parties have to wait.
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }
}

/// An instance held by a party.
///
/// The only way to credit a run is [`InstancePool::release`]. Dropping the lease
/// instead returns the instance to its pool without counting a served party.
#[must_use = "a lease holds its instance until released"]
pub struct InstanceLease {
    id: InstanceId,
    pool: Option<Arc<InstancePool>>,
}

impl InstanceLease {
    pub fn instance_id(&self) -> InstanceId {
        self.id
    }
}

impl std::fmt::Debug for InstanceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceLease")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for InstanceLease {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            tracing::warn!(instance = %self.id, "Lease dropped without release - instance returned uncredited");
            pool.give_back(self.id, None);
        }
    }
}

/// Fixed-size pool of dungeon instances shared by every party of a run.
pub struct InstancePool {
    state: Mutex<PoolState>,
    released: Notify,
    capacity: usize,
}

impl InstancePool {
    /// Create a pool with `capacity` instances, all initially free.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero: nothing could ever be acquired.
    pub fn new(capacity: usize) -> Arc<Self> {
        assert!(capacity > 0, "instance pool capacity must be > 0");

        let slots = (0..capacity)
            .map(|i| InstanceSlot::new(InstanceId::new(i)))
            .collect();
        let free = (0..capacity).map(InstanceId::new).collect();

        Arc::new(Self {
            state: Mutex::new(PoolState { slots, free }),
            released: Notify::new(),
            capacity,
        })
    }

    /// Lock the pool state. On poison, log and keep going: every mutation
    /// completes before anything that could panic.
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Instance pool mutex poisoned - recovering state");
                self.state.clear_poison();
                poisoned.into_inner()
            }
        }
    }

    /// Wait for a free instance and take it.
    ///
    /// Which of several waiting parties wins a freed instance is unspecified;
    /// each freed instance goes to exactly one of them.
    pub async fn acquire(self: &Arc<Self>) -> InstanceLease {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // Register as a waiter before looking, so a release that lands
            // between the check and the await still wakes us.
            notified.as_mut().enable();

            if let Some(lease) = self.try_acquire() {
                return lease;
            }

            notified.await;
        }
    }

    /// Take a free instance if there is one right now.
    pub fn try_acquire(self: &Arc<Self>) -> Option<InstanceLease> {
        let id = self.lock_state().take_free()?;
        tracing::debug!(instance = %id, "Instance acquired");

        Some(InstanceLease {
            id,
            pool: Some(Arc::clone(self)),
        })
    }

    /// Return a leased instance, crediting one served party and `run_time`.
    ///
    /// # Panics
    ///
    /// Panics if the lease was issued by a different pool.
    pub fn release(&self, mut lease: InstanceLease, run_time: u32) {
        assert!(
            lease
                .pool
                .as_ref()
                .is_some_and(|pool| std::ptr::eq(Arc::as_ptr(pool), self)),
            "lease for instance {} released to a pool that did not issue it",
            lease.id
        );
        lease.pool = None;

        tracing::debug!(instance = %lease.id, run_time, "Instance released");
        self.give_back(lease.id, Some(run_time));
    }

    fn give_back(&self, id: InstanceId, run_time: Option<u32>) {
        self.lock_state().give_back(id, run_time);
        self.released.notify_one();
    }

    /// Consistent occupancy view. The lock is held only while copying.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.lock_state();
        PoolSnapshot {
            instances: state.slots.iter().map(InstanceSlot::status).collect(),
            free: state.free.iter().copied().collect(),
        }
    }

    /// Per-instance statistics in id order.
    pub fn final_stats(&self) -> Vec<InstanceStats> {
        self.lock_state()
            .slots
            .iter()
            .map(InstanceSlot::stats)
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.lock_state().free.len()
    }
}
