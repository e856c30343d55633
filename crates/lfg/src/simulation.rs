//! Simulation driver.
//!
//! Flow:
//! 1. Validate the configuration and form parties from the role supply
//! 2. Build the instance pool and start the status observer
//! 3. Spawn one task per party and wait for all of them
//! 4. Stop the observer and collect final statistics

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinError;

use crate::config::{ConfigError, SimulationConfig};
use crate::instance::InstancePool;
use crate::observer::StatusObserver;
use crate::party::{Party, PartyId, RunTimeSource, SeededRunTimes};
use crate::report::SimulationReport;
use crate::reporter::{Reporter, TracingReporter};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("party task failed")]
    PartyTask(#[source] JoinError),
    #[error("status observer failed")]
    Observer(#[source] JoinError),
}

/// One configured run of the dungeon queue.
pub struct Simulation {
    config: SimulationConfig,
    reporter: Arc<dyn Reporter>,
    run_times: Arc<dyn RunTimeSource>,
}

impl Simulation {
    /// Validate `config` and prepare a run that reports through `tracing`.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let run_times = match config.seed {
            Some(seed) => SeededRunTimes::from_seed(seed),
            None => SeededRunTimes::from_os_rng(),
        };

        Ok(Self {
            config,
            reporter: Arc::new(TracingReporter),
            run_times: Arc::new(run_times),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the run-time source (overrides any configured seed).
    pub fn with_run_times(mut self, run_times: Arc<dyn RunTimeSource>) -> Self {
        self.run_times = run_times;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub async fn run(self) -> Result<SimulationReport, SimulationError> {
        let config = &self.config;
        let parties = config.roles.parties();
        tracing::info!(
            parties,
            instances = config.instances,
            min_run_time = config.run_time.min(),
            max_run_time = config.run_time.max(),
            "Starting simulation"
        );

        let pool = InstancePool::new(config.instances);
        let observer = StatusObserver::new(
            Arc::clone(&pool),
            Arc::clone(&self.reporter),
            config.status_interval(),
        )
        .spawn();

        let handles = (1..=parties).map(|n| {
            Party::new(
                PartyId::new(n),
                Arc::clone(&pool),
                Arc::clone(&self.run_times),
                config.run_time,
                config.time_unit,
                Arc::clone(&self.reporter),
            )
            .spawn()
        });
        let results = join_all(handles).await;

        let mut runs = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(run) => runs.push(run),
                Err(e) => {
                    tracing::error!(error = %e, "Party task failed");
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        let status_ticks = observer.stop().await.map_err(SimulationError::Observer)?;
        if let Some(e) = failure {
            return Err(SimulationError::PartyTask(e));
        }

        let report = SimulationReport {
            parties,
            instances: pool.final_stats(),
            leftover: config.roles.leftover(parties),
            runs,
            status_ticks,
        };
        tracing::info!(
            served = report.parties_served(),
            status_ticks,
            "Simulation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::config::{RoleCounts, RunTimeRange};
    use crate::testing::RecordingReporter;

    /// Hands out a fixed sequence of run times, one per draw.
    struct ScriptedRunTimes {
        script: Mutex<Vec<u32>>,
    }

    impl ScriptedRunTimes {
        fn new(script: &[u32]) -> Self {
            Self {
                script: Mutex::new(script.iter().rev().copied().collect()),
            }
        }

        fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    impl RunTimeSource for ScriptedRunTimes {
        fn draw(&self, range: RunTimeRange) -> u32 {
            let run_time = self.script.lock().unwrap().pop().expect("script exhausted");
            assert!(range.contains(run_time));
            run_time
        }
    }

    /// Exactly `parties` parties, with no leftover players.
    fn roles(parties: u32) -> RoleCounts {
        RoleCounts::new(parties, parties, parties * RoleCounts::DPS_PER_PARTY)
    }

    async fn run(
        config: SimulationConfig,
    ) -> (SimulationReport, Arc<RecordingReporter>, Duration) {
        let reporter = Arc::new(RecordingReporter::default());
        let started = Instant::now();
        let report = Simulation::new(config)
            .unwrap()
            .with_reporter(Arc::clone(&reporter) as Arc<dyn Reporter>)
            .run()
            .await
            .unwrap();
        (report, reporter, started.elapsed())
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = SimulationConfig::new(1, roles(1), RunTimeRange::fixed(1));
        config.instances = 0;

        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::Config(ConfigError::NoInstances))
        ));
    }

    #[test]
    fn new_keeps_the_validated_config() {
        let config = SimulationConfig::new(2, roles(1), RunTimeRange::fixed(1)).with_seed(9);
        let simulation = Simulation::new(config.clone()).unwrap();

        assert_eq!(simulation.config(), &config);
    }

    #[tokio::test]
    async fn task_failure_is_reported_once() {
        let join_error = tokio::spawn(async { panic!("party exploded") })
            .await
            .unwrap_err();
        let source = join_error.to_string();

        let error = SimulationError::PartyTask(join_error);
        assert_eq!(error.to_string(), "party task failed");
        let chained = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(chained, Some(source));
    }

    #[tokio::test(start_paused = true)]
    async fn injected_run_times_reach_every_party() {
        let script = [4, 1, 6];
        let run_times = Arc::new(ScriptedRunTimes::new(&script));
        let reporter = Arc::new(RecordingReporter::default());
        let config = SimulationConfig::new(3, roles(3), RunTimeRange::new(0, 10).unwrap());

        let started = Instant::now();
        let report = Simulation::new(config)
            .unwrap()
            .with_reporter(Arc::clone(&reporter) as Arc<dyn Reporter>)
            .with_run_times(Arc::clone(&run_times) as Arc<dyn RunTimeSource>)
            .run()
            .await
            .unwrap();

        // Every party gets its own instance, so each instance served one scripted run.
        assert_eq!(run_times.remaining(), 0);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        let mut served: Vec<u64> = report.instances.iter().map(|s| s.time_served).collect();
        served.sort();
        assert_eq!(served, vec![1, 4, 6]);
        assert!(report.instances.iter().all(|s| s.parties_served == 1));
        reporter.assert_no_overlap();
    }

    #[tokio::test(start_paused = true)]
    async fn single_instance_serves_parties_one_after_another() {
        let config = SimulationConfig::new(1, roles(3), RunTimeRange::fixed(0));
        let (report, reporter, _) = run(config).await;

        assert_eq!(report.parties, 3);
        assert_eq!(report.instances.len(), 1);
        assert_eq!(report.instances[0].parties_served, 3);
        assert_eq!(report.instances[0].time_served, 0);
        assert_eq!(reporter.max_concurrent(), 1);
        reporter.assert_no_overlap();
    }

    #[tokio::test(start_paused = true)]
    async fn enough_instances_means_no_waiting() {
        let config = SimulationConfig::new(2, roles(2), RunTimeRange::fixed(5));
        let (report, reporter, elapsed) = run(config).await;

        assert_eq!(elapsed, Duration::from_secs(5));
        assert!(report.runs.iter().all(|r| r.waited() == Duration::ZERO));
        for stats in &report.instances {
            assert_eq!(stats.parties_served, 1);
            assert_eq!(stats.time_served, 5);
        }
        assert_eq!(reporter.max_concurrent(), 2);
        assert!(report.status_ticks >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn no_parties_leaves_instances_empty() {
        let config = SimulationConfig::new(1, RoleCounts::new(0, 5, 9), RunTimeRange::fixed(3));
        let (report, reporter, _) = run(config).await;

        assert_eq!(report.parties, 0);
        assert!(report.runs.is_empty());
        assert_eq!(report.instances[0].parties_served, 0);
        assert_eq!(report.leftover, RoleCounts::new(0, 5, 9));
        assert!(report.status_ticks >= 1);

        let statuses = reporter.statuses();
        assert_eq!(statuses.len() as u64, report.status_ticks);
        assert!(statuses.iter().all(|s| s.active() == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn demand_beyond_capacity_queues() {
        let config = SimulationConfig::new(2, roles(5), RunTimeRange::fixed(1));
        let (report, reporter, elapsed) = run(config).await;

        // Five one-unit runs through two instances take three rounds.
        assert_eq!(elapsed, Duration::from_secs(3));
        assert_eq!(report.parties_served(), 5);
        assert_eq!(report.runs.len(), 5);
        assert_eq!(reporter.max_concurrent(), 2);
        reporter.assert_no_overlap();
        for snapshot in reporter.statuses() {
            assert!(snapshot.active() <= 2);
            assert_eq!(snapshot.active() + snapshot.available(), 2);
        }
        assert_eq!(report.longest_wait(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn random_run_times_stay_in_range_and_add_up() {
        let range = RunTimeRange::new(2, 7).unwrap();
        let config = SimulationConfig::new(3, roles(20), range).with_seed(11);
        let (report, reporter, _) = run(config).await;

        assert_eq!(report.parties_served(), 20);
        assert!(report.runs.iter().all(|r| range.contains(r.run_time)));
        for stats in &report.instances {
            let expected: u64 = report
                .runs
                .iter()
                .filter(|r| r.instance == stats.id)
                .map(|r| u64::from(r.run_time))
                .sum();
            let served = report.runs.iter().filter(|r| r.instance == stats.id).count();
            assert_eq!(stats.time_served, expected);
            assert_eq!(stats.parties_served, served as u64);
        }
        assert!(reporter.max_concurrent() <= 3);
        reporter.assert_no_overlap();
    }

    #[tokio::test(start_paused = true)]
    async fn leftover_players_reported() {
        let config = SimulationConfig::new(2, RoleCounts::new(4, 3, 10), RunTimeRange::fixed(1));
        let (report, _, _) = run(config).await;

        assert_eq!(report.parties, 3);
        assert_eq!(report.leftover, RoleCounts::new(1, 0, 1));
        assert_eq!(
            report.runs.iter().map(|r| r.party.get()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn runs_on_a_real_clock() {
        let config = SimulationConfig::new(2, roles(6), RunTimeRange::new(0, 2).unwrap())
            .with_time_unit(Duration::from_millis(5))
            .with_seed(3);
        let (report, reporter, _) = run(config).await;

        assert_eq!(report.parties_served(), 6);
        assert!(reporter.max_concurrent() <= 2);
        reporter.assert_no_overlap();
    }
}
