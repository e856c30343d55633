//! Instance pool for queued dungeon runs.
//!
//! Leases make the release protocol hard to misuse:
//! - `InstancePool::acquire` / `try_acquire` are the only way to get an [`InstanceLease`]
//! - `InstancePool::release` consumes the lease, so an instance cannot be released twice
//! - a lease dropped without release hands its instance back uncredited

mod pool;
mod slot;

pub use pool::{InstanceLease, InstancePool, PoolSnapshot};
pub use slot::{InstanceId, InstanceStats, InstanceStatus};
