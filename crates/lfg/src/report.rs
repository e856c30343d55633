//! End-of-run report.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

use crate::config::RoleCounts;
use crate::instance::InstanceStats;
use crate::party::PartyRun;

/// Everything a finished simulation has to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Parties formed (and run) from the role supply.
    pub parties: u32,
    /// Per-instance statistics in id order.
    pub instances: Vec<InstanceStats>,
    /// Players who could not be placed in a party.
    pub leftover: RoleCounts,
    /// One entry per party, in party order.
    pub runs: Vec<PartyRun>,
    /// Status reports rendered while the run was in progress.
    pub status_ticks: u64,
}

impl SimulationReport {
    pub fn parties_served(&self) -> u64 {
        self.instances.iter().map(|s| s.parties_served).sum()
    }

    pub fn total_wait(&self) -> Duration {
        self.runs.iter().map(PartyRun::waited).sum()
    }

    pub fn longest_wait(&self) -> Duration {
        self.runs
            .iter()
            .map(PartyRun::waited)
            .max()
            .unwrap_or_default()
    }

    /// The final summary block printed after a run.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out);
        let _ = writeln!(out, "Final Summary:");
        for stats in &self.instances {
            let _ = writeln!(
                out,
                "Instance {} served {} parties, total time served: {} seconds.",
                stats.id, stats.parties_served, stats.time_served
            );
        }
        let _ = writeln!(
            out,
            "Leftover players: {} tanks, {} healers, {} DPS.",
            self.leftover.tanks, self.leftover.healers, self.leftover.dps
        );
        if !self.runs.is_empty() {
            let _ = writeln!(
                out,
                "Longest queue wait: {:.1}s (total {:.1}s).",
                self.longest_wait().as_secs_f64(),
                self.total_wait().as_secs_f64()
            );
        }
        out
    }
}
