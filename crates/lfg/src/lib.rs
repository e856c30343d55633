//! lfg: dungeon queue simulator.
//!
//! Parties formed from queued players compete for a fixed pool of dungeon
//! instances. Each party waits for a free instance, runs for a random time and
//! hands the instance back; a status observer reports occupancy while the run
//! is in progress.

pub mod config;
pub mod instance;
pub mod observer;
pub mod party;
mod report;
pub mod reporter;
pub mod simulation;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, RoleCounts, RunTimeRange, SimulationConfig};
pub use instance::{
    InstanceId, InstanceLease, InstancePool, InstanceStats, InstanceStatus, PoolSnapshot,
};
pub use observer::{CancellationToken, ObserverHandle, StatusObserver};
pub use party::{Party, PartyId, PartyRun, PartyState, RunTimeSource, SeededRunTimes};
pub use report::SimulationReport;
pub use reporter::{ConsoleReporter, Reporter, TracingReporter};
pub use simulation::{Simulation, SimulationError};
