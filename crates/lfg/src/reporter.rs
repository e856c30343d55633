//! Progress reporting seam between the simulation and whatever renders it.

use std::io::Write;
use std::sync::Mutex;

use crate::instance::{InstanceId, PoolSnapshot};
use crate::party::PartyId;

/// Receives progress events as a simulation runs.
///
/// Calls arrive from many tasks at once. Implementations must not block for
/// long: a party calls `party_finished` before handing its instance back.
pub trait Reporter: Send + Sync {
    fn party_entered(&self, party: PartyId, instance: InstanceId);

    fn party_finished(&self, party: PartyId, instance: InstanceId, run_time: u32);

    fn instance_status(&self, snapshot: &PoolSnapshot);
}

/// Writes human-readable progress lines.
pub struct ConsoleReporter<W> {
    out: Mutex<W>,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, render: impl FnOnce(&mut W) -> std::io::Result<()>) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = render(&mut *out).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "Failed to write progress output");
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn party_entered(&self, party: PartyId, instance: InstanceId) {
        self.emit(|out| writeln!(out, "Party {party} entered instance {instance}."));
    }

    fn party_finished(&self, party: PartyId, instance: InstanceId, run_time: u32) {
        self.emit(|out| {
            writeln!(
                out,
                "Party {party} finished instance {instance} in {run_time} seconds."
            )
        });
    }

    fn instance_status(&self, snapshot: &PoolSnapshot) {
        self.emit(|out| {
            writeln!(out)?;
            writeln!(out, "Instance Status:")?;
            for status in &snapshot.instances {
                writeln!(out, "Instance {}: {}", status.id, status.as_str())?;
            }
            Ok(())
        });
    }
}

/// Sends progress to `tracing` instead of stdout (used with `--json`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn party_entered(&self, party: PartyId, instance: InstanceId) {
        tracing::info!(party = %party, instance = %instance, "Party entered instance");
    }

    fn party_finished(&self, party: PartyId, instance: InstanceId, run_time: u32) {
        tracing::info!(party = %party, instance = %instance, run_time, "Party finished instance");
    }

    fn instance_status(&self, snapshot: &PoolSnapshot) {
        tracing::info!(
            active = snapshot.active(),
            available = snapshot.available(),
            capacity = snapshot.capacity(),
            "Instance status"
        );
    }
}
