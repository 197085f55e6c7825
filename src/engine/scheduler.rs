//! Poll and summary cadences
//!
//! The poll cadence is interval-from-start: a slow sweep shortens the wait
//! before the next one instead of pushing every later sweep back. The summary
//! cadence is checked once after each sweep, so it can never fire more often
//! than sweeps do.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::poll::{PollCycle, SweepReport};
use super::summary::SummaryReporter;
use crate::common::types::MonitorEvent;
use crate::config::types::ScheduleConfig;

/// Lifecycle of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Preloading,
    Running,
    Stopped,
}

impl std::fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerPhase::Idle => write!(f, "idle"),
            SchedulerPhase::Preloading => write!(f, "preloading"),
            SchedulerPhase::Running => write!(f, "running"),
            SchedulerPhase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Tracks when the next summary is due
#[derive(Debug, Clone, Copy)]
pub struct SummaryCadence {
    period: Duration,
    last: Instant,
}

impl SummaryCadence {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last: Instant::now(),
        }
    }

    /// True (and the timer restarts) once at least one period has elapsed
    pub fn take_due(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Drives [`PollCycle`] on a fixed cadence and emits periodic summaries
pub struct Scheduler {
    cycle: PollCycle,
    reporter: SummaryReporter,
    schedule: ScheduleConfig,
    phase: watch::Sender<SchedulerPhase>,
    last_sweep: Option<SweepReport>,
    sweeps: u64,
}

impl Scheduler {
    pub fn new(cycle: PollCycle, schedule: ScheduleConfig) -> Self {
        let reporter = SummaryReporter::new(cycle.instruments().to_vec());
        let (phase, _) = watch::channel(SchedulerPhase::Idle);
        Self {
            cycle,
            reporter,
            schedule,
            phase,
            last_sweep: None,
            sweeps: 0,
        }
    }

    /// Observe phase transitions
    pub fn subscribe_phase(&self) -> watch::Receiver<SchedulerPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.borrow()
    }

    /// Most recent sweep (the preload counts)
    pub fn last_sweep(&self) -> Option<&SweepReport> {
        self.last_sweep.as_ref()
    }

    /// Regular sweeps completed, excluding the preload
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps
    }

    /// Preload, then sweep until `shutdown` flips to `true`
    ///
    /// Shutdown is only observed between sweeps; an in-flight sweep always
    /// completes.
    #[instrument(skip_all)]
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        self.set_phase(SchedulerPhase::Preloading);
        let preload = self.cycle.preload().await;
        self.last_sweep = Some(preload);

        if *shutdown.borrow() {
            self.set_phase(SchedulerPhase::Stopped);
            return;
        }

        info!(
            poll_interval_seconds = self.schedule.poll_interval_seconds,
            summary_interval_seconds = self.schedule.summary_interval_seconds,
            "Monitoring started"
        );
        self.set_phase(SchedulerPhase::Running);

        let mut ticker = interval(self.schedule.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut summary = SummaryCadence::new(self.schedule.summary_interval());

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    // A dropped sender also means stop
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested");
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.run_sweep().await;

            if summary.take_due() {
                self.emit_summary().await;
            }
        }

        self.set_phase(SchedulerPhase::Stopped);
        info!(sweeps = self.sweeps, "Scheduler stopped");
    }

    /// Preload, one sweep and one summary, for single-shot runs
    #[instrument(skip_all)]
    pub async fn run_once(&mut self) {
        self.set_phase(SchedulerPhase::Preloading);
        let preload = self.cycle.preload().await;
        self.last_sweep = Some(preload);

        self.set_phase(SchedulerPhase::Running);
        self.run_sweep().await;
        self.emit_summary().await;
        self.set_phase(SchedulerPhase::Stopped);
    }

    async fn run_sweep(&mut self) {
        let report = self.cycle.sweep().await;
        self.sweeps += 1;

        let poll_interval = self.schedule.poll_interval();
        if report.elapsed > poll_interval {
            warn!(
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Sweep took longer than the poll interval"
            );
        }
        info!(
            sweep = self.sweeps,
            fetched = report.fetched,
            failed = report.failed,
            alerts = report.alerts,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Completed check cycle"
        );
        self.last_sweep = Some(report);
    }

    async fn emit_summary(&self) {
        let report = self.reporter.report(self.cycle.store()).await;
        debug!(rows = report.rows.len(), "Emitting summary report");
        if let Err(e) = self.cycle.sink().emit(MonitorEvent::Summary(report)).await {
            warn!(error = %e, "Failed to deliver summary");
        }
    }

    fn set_phase(&self, phase: SchedulerPhase) {
        debug!(%phase, "Scheduler phase change");
        self.phase.send_replace(phase);
    }
}
