//! Status observer: periodic occupancy reports while parties run.
//!
//! The observer renders immediately on start, then once per interval, until its
//! [`CancellationToken`] fires. Cancellation is checked while waiting for the
//! next tick, so stopping never waits out a full interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
pub use tokio_util::sync::CancellationToken;

use crate::instance::InstancePool;
use crate::reporter::Reporter;

pub struct StatusObserver {
    pool: Arc<InstancePool>,
    reporter: Arc<dyn Reporter>,
    interval: Duration,
    cancel: CancellationToken,
}

impl StatusObserver {
    pub fn new(pool: Arc<InstancePool>, reporter: Arc<dyn Reporter>, interval: Duration) -> Self {
        Self {
            pool,
            reporter,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop on `cancel` instead of a private token.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report until cancelled. Returns the number of reports rendered.
    pub async fn run(self) -> u64 {
        let mut ticks = 0u64;
        loop {
            // Copy under the pool lock, render outside it.
            let snapshot = self.pool.snapshot();
            self.reporter.instance_status(&snapshot);
            ticks += 1;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::debug!(ticks, "Status observer stopped");
        ticks
    }

    pub fn spawn(self) -> ObserverHandle {
        let cancel = self.cancel.clone();
        ObserverHandle {
            cancel,
            task: tokio::spawn(self.run()),
        }
    }
}

/// Handle to a running [`StatusObserver`].
pub struct ObserverHandle {
    cancel: CancellationToken,
    task: JoinHandle<u64>,
}

impl ObserverHandle {
    /// Signal the observer and wait for it. Returns the number of reports.
    pub async fn stop(self) -> Result<u64, JoinError> {
        self.cancel.cancel();
        self.task.await
    }
}
