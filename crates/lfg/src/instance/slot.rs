//! Per-instance state and the read-only views the pool hands out.

use serde::Serialize;

/// Identifier of a dungeon instance.
///
/// Ids are assigned `0..capacity` in construction order and stay stable for the
/// lifetime of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct InstanceId(usize);

impl InstanceId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the instance inside its pool.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable state of one instance. Only ever touched under the pool lock.
#[derive(Debug)]
pub(crate) struct InstanceSlot {
    id: InstanceId,
    active: bool,
    parties_served: u64,
    time_served: u64,
}

impl InstanceSlot {
    pub(crate) fn new(id: InstanceId) -> Self {
        Self {
            id,
            active: false,
            parties_served: 0,
            time_served: 0,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn occupy(&mut self) {
        debug_assert!(!self.active, "instance {} occupied twice", self.id);
        self.active = true;
    }

    /// Vacate after a completed run, crediting the party and its run time.
    pub(crate) fn complete(&mut self, run_time: u32) {
        debug_assert!(self.active, "instance {} completed while empty", self.id);
        self.active = false;
        self.parties_served += 1;
        self.time_served += u64::from(run_time);
    }

    /// Vacate without crediting anything (lease dropped mid-run).
    pub(crate) fn abandon(&mut self) {
        debug_assert!(self.active, "instance {} abandoned while empty", self.id);
        self.active = false;
    }

    pub(crate) fn status(&self) -> InstanceStatus {
        InstanceStatus {
            id: self.id,
            active: self.active,
        }
    }

    pub(crate) fn stats(&self) -> InstanceStats {
        InstanceStats {
            id: self.id,
            parties_served: self.parties_served,
            time_served: self.time_served,
        }
    }
}

/// Occupancy of one instance at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstanceStatus {
    pub id: InstanceId,
    pub active: bool,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        if self.active { "active" } else { "empty" }
    }
}

/// Cumulative statistics of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstanceStats {
    pub id: InstanceId,
    /// Parties that completed a run on this instance.
    pub parties_served: u64,
    /// Sum of those parties' run times, in time units.
    pub time_served: u64,
}
