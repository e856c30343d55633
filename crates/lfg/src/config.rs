//! Simulation configuration: role supply, instance count and run-time bounds.

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one instance is required")]
    NoInstances,
    #[error("minimum run time {min} exceeds maximum run time {max}")]
    InvertedRunTime { min: u32, max: u32 },
    #[error("time unit must be greater than zero")]
    ZeroTimeUnit,
    #[error("status interval must be greater than zero")]
    ZeroStatusInterval,
    #[error("maximum run time {max} overflows the time unit of {time_unit:?}")]
    RunTimeOverflow { max: u32, time_unit: Duration },
}

/// Players queued per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub tanks: u32,
    pub healers: u32,
    pub dps: u32,
}

impl RoleCounts {
    /// A party is one tank, one healer and this many DPS.
    pub const DPS_PER_PARTY: u32 = 3;

    pub fn new(tanks: u32, healers: u32, dps: u32) -> Self {
        Self {
            tanks,
            healers,
            dps,
        }
    }

    /// Number of complete parties this supply can form.
    pub fn parties(&self) -> u32 {
        self.tanks
            .min(self.healers)
            .min(self.dps / Self::DPS_PER_PARTY)
    }

    /// Players left in the queue after forming `parties` parties.
    pub fn leftover(&self, parties: u32) -> RoleCounts {
        RoleCounts {
            tanks: self.tanks.saturating_sub(parties),
            healers: self.healers.saturating_sub(parties),
            dps: self
                .dps
                .saturating_sub(parties.saturating_mul(Self::DPS_PER_PARTY)),
        }
    }
}

/// Inclusive range of dungeon run times, in time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunTimeRange {
    min: u32,
    max: u32,
}

impl RunTimeRange {
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedRunTime { min, max });
        }
        Ok(Self { min, max })
    }

    /// Every run takes exactly `run_time`.
    pub fn fixed(run_time: u32) -> Self {
        Self {
            min: run_time,
            max: run_time,
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, run_time: u32) -> bool {
        (self.min..=self.max).contains(&run_time)
    }
}

/// Everything a simulation run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Concurrent dungeon instances.
    pub instances: usize,
    pub roles: RoleCounts,
    pub run_time: RunTimeRange,
    /// Wall-clock length of one simulated second.
    pub time_unit: Duration,
    /// Status report period. Defaults to one time unit.
    pub status_interval: Option<Duration>,
    /// Seed for run-time draws. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

    pub fn new(instances: usize, roles: RoleCounts, run_time: RunTimeRange) -> Self {
        Self {
            instances,
            roles,
            run_time,
            time_unit: Self::DEFAULT_TIME_UNIT,
            status_interval: None,
            seed: None,
        }
    }

    pub fn with_time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = time_unit;
        self
    }

    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = Some(interval);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn status_interval(&self) -> Duration {
        self.status_interval.unwrap_or(self.time_unit)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instances == 0 {
            return Err(ConfigError::NoInstances);
        }
        if self.run_time.min > self.run_time.max {
            return Err(ConfigError::InvertedRunTime {
                min: self.run_time.min,
                max: self.run_time.max,
            });
        }
        if self.time_unit.is_zero() {
            return Err(ConfigError::ZeroTimeUnit);
        }
        if self.status_interval().is_zero() {
            return Err(ConfigError::ZeroStatusInterval);
        }
        if self.time_unit.checked_mul(self.run_time.max).is_none() {
            return Err(ConfigError::RunTimeOverflow {
                max: self.run_time.max,
                time_unit: self.time_unit,
            });
        }
        Ok(())
    }
}
