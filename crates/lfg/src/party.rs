//! Parties: queue for an instance, run the dungeon, leave.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::RunTimeRange;
use crate::instance::{InstanceId, InstancePool};
use crate::reporter::Reporter;

/// Identifier of a party, numbered from 1 in launch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PartyId(u32);

impl PartyId {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PartyState {
    Created,
    /// Queued in `InstancePool::acquire`.
    Waiting,
    /// Holding an instance for its run time.
    Occupying,
    Released,
}

impl PartyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Waiting => "waiting",
            Self::Occupying => "occupying",
            Self::Released => "released",
        }
    }
}

/// Source of dungeon run times, shared by every party of a simulation.
pub trait RunTimeSource: Send + Sync {
    /// Draw one run time uniformly from `range` (inclusive).
    fn draw(&self, range: RunTimeRange) -> u32;
}

/// [`RunTimeSource`] backed by a single [`StdRng`].
pub struct SeededRunTimes {
    rng: Mutex<StdRng>,
}

impl SeededRunTimes {
    /// Repeatable draws for a given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl RunTimeSource for SeededRunTimes {
    fn draw(&self, range: RunTimeRange) -> u32 {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.random_range(range.min()..=range.max())
    }
}

/// What one party did, returned when its task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartyRun {
    pub party: PartyId,
    pub instance: InstanceId,
    /// Time units spent in the dungeon.
    pub run_time: u32,
    /// Wall-clock milliseconds spent queued before an instance was free.
    pub waited_ms: u64,
}

impl PartyRun {
    pub fn waited(&self) -> Duration {
        Duration::from_millis(self.waited_ms)
    }
}

/// One party's full lifecycle: acquire, occupy, release.
pub struct Party {
    id: PartyId,
    pool: Arc<InstancePool>,
    run_times: Arc<dyn RunTimeSource>,
    range: RunTimeRange,
    time_unit: Duration,
    reporter: Arc<dyn Reporter>,
    state: PartyState,
}

impl Party {
    pub fn new(
        id: PartyId,
        pool: Arc<InstancePool>,
        run_times: Arc<dyn RunTimeSource>,
        range: RunTimeRange,
        time_unit: Duration,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            id,
            pool,
            run_times,
            range,
            time_unit,
            reporter,
            state: PartyState::Created,
        }
    }

    pub fn state(&self) -> PartyState {
        self.state
    }

    fn transition(&mut self, next: PartyState) {
        debug_assert!(
            next > self.state,
            "party {} moved backwards: {} -> {}",
            self.id,
            self.state.as_str(),
            next.as_str()
        );
        tracing::trace!(party = %self.id, from = self.state.as_str(), to = next.as_str(), "Party state");
        self.state = next;
    }

    /// Run to completion. The only suspension points are the wait for an
    /// instance and the run itself.
    pub async fn run(mut self) -> PartyRun {
        self.transition(PartyState::Waiting);
        let queued_at = Instant::now();
        let lease = self.pool.acquire().await;
        let waited = queued_at.elapsed();
        let instance = lease.instance_id();

        self.transition(PartyState::Occupying);
        self.reporter.party_entered(self.id, instance);
        tracing::debug!(party = %self.id, instance = %instance, waited = ?waited, "Party entered instance");

        let run_time = self.run_times.draw(self.range);
        debug_assert!(self.range.contains(run_time));
        tokio::time::sleep(self.time_unit.saturating_mul(run_time)).await;

        self.reporter.party_finished(self.id, instance, run_time);
        self.pool.release(lease, run_time);
        self.transition(PartyState::Released);
        tracing::debug!(party = %self.id, instance = %instance, run_time, "Party finished instance");

        PartyRun {
            party: self.id,
            instance,
            run_time,
            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn spawn(self) -> JoinHandle<PartyRun> {
        tokio::spawn(self.run())
    }
}
