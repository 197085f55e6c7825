//! One fetch-evaluate-update pass over every configured instrument

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::evaluator::evaluate;
use super::state::StateStore;
use crate::common::errors::{MonitorError, Result};
use crate::common::traits::{EventSink, MarketDataSource};
use crate::common::types::{AlertEvent, AlertKind, Instrument, MonitorEvent, Quote};
use crate::config::types::AlertConfig;

/// Default per-fetch deadline
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Counters for a completed sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Instruments fetched and evaluated
    pub fetched: usize,
    /// Instruments skipped because of a fetch failure
    pub failed: usize,
    /// Alerts raised
    pub alerts: usize,
}

/// Result of polling one instrument
#[derive(Debug)]
pub enum InstrumentOutcome {
    /// State was written back; carries the alert if one fired
    Updated(Option<AlertEvent>),
    /// Fetch failed; state untouched
    Skipped(MonitorError),
}

/// Drives a single sweep: fetch, evaluate, write back, emit
pub struct PollCycle {
    instruments: Vec<Instrument>,
    source: Arc<dyn MarketDataSource>,
    store: Arc<StateStore>,
    sink: Arc<dyn EventSink>,
    thresholds: AlertConfig,
    fetch_timeout: Duration,
    max_concurrent_fetches: usize,
}

impl PollCycle {
    pub fn new(
        instruments: Vec<Instrument>,
        source: Arc<dyn MarketDataSource>,
        store: Arc<StateStore>,
        sink: Arc<dyn EventSink>,
        thresholds: AlertConfig,
    ) -> Self {
        Self {
            instruments,
            source,
            store,
            sink,
            thresholds,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent_fetches: 1,
        }
    }

    /// Set the deadline applied to every fetch
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Allow up to `n` fetches in flight within a sweep
    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Seed state before the regular cadence starts
    ///
    /// Instruments already below threshold alert here rather than at the
    /// first scheduled sweep.
    #[instrument(skip(self), fields(source = self.source.source_name()))]
    pub async fn preload(&self) -> SweepReport {
        info!(
            instruments = self.instruments.len(),
            "Preloading reference highs and current prices"
        );
        let report = self.sweep_inner().await;
        info!(
            fetched = report.fetched,
            failed = report.failed,
            alerts = report.alerts,
            "Preload complete"
        );
        report
    }

    /// Run one sweep over every instrument
    #[instrument(skip(self), fields(source = self.source.source_name()))]
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_inner().await
    }

    async fn sweep_inner(&self) -> SweepReport {
        let started_at = Utc::now();
        let start = Instant::now();

        // Boxed up front so the sweep future stays Send for tokio::spawn
        let polls: Vec<BoxFuture<'_, InstrumentOutcome>> = self
            .instruments
            .iter()
            .map(|instrument| self.poll_instrument(instrument).boxed())
            .collect();

        let outcomes: Vec<InstrumentOutcome> = stream::iter(polls)
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        let mut report = SweepReport {
            started_at,
            elapsed: Duration::ZERO,
            fetched: 0,
            failed: 0,
            alerts: 0,
        };
        for outcome in &outcomes {
            match outcome {
                InstrumentOutcome::Updated(alert) => {
                    report.fetched += 1;
                    if alert.is_some() {
                        report.alerts += 1;
                    }
                }
                InstrumentOutcome::Skipped(_) => report.failed += 1,
            }
        }
        report.elapsed = start.elapsed();

        debug!(
            fetched = report.fetched,
            failed = report.failed,
            alerts = report.alerts,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Sweep finished"
        );
        report
    }

    /// Fetch, evaluate and commit a single instrument
    pub async fn poll_instrument(&self, instrument: &Instrument) -> InstrumentOutcome {
        let quote = match self.fetch(instrument).await {
            Ok(quote) => quote,
            Err(e) => {
                if e.is_transient() {
                    warn!(symbol = %instrument.symbol, error = %e, "Fetch failed, skipping this cycle");
                } else {
                    error!(symbol = %instrument.symbol, error = %e, "Data source fault, skipping this cycle");
                }
                return InstrumentOutcome::Skipped(e);
            }
        };

        let thresholds = self.thresholds;
        let alert = self
            .store
            .update(&instrument.symbol, |prev| {
                let eval = evaluate(prev, quote.price, quote.reference_high, &thresholds);
                (eval.state, eval.alert)
            })
            .await;

        debug!(symbol = %instrument.symbol, price = %quote.price, "Instrument evaluated");

        let alert = alert.map(|kind| AlertEvent {
            instrument: instrument.clone(),
            kind,
            timestamp: Utc::now(),
        });

        if let Some(ref event) = alert {
            log_alert(event);
            if let Err(e) = self.sink.emit(MonitorEvent::Alert(event.clone())).await {
                warn!(symbol = %instrument.symbol, error = %e, "Failed to deliver alert");
            }
        }

        InstrumentOutcome::Updated(alert)
    }

    async fn fetch(&self, instrument: &Instrument) -> Result<Quote> {
        let quote = timeout(self.fetch_timeout, self.source.fetch(instrument))
            .await
            .map_err(|_| {
                MonitorError::Timeout(format!(
                    "{} after {:?}",
                    instrument.symbol, self.fetch_timeout
                ))
            })??;
        quote.validated(&instrument.symbol)
    }
}

fn log_alert(event: &AlertEvent) {
    match &event.kind {
        AlertKind::InitialDrop {
            price,
            reference_high,
            threshold_pct,
            ..
        } => info!(
            symbol = %event.instrument.symbol,
            price = %price,
            reference_high = %reference_high,
            "Price is {}% or more below its reference high",
            threshold_pct
        ),
        AlertKind::IncrementalDrop {
            price,
            previous_alert_price,
            cumulative_fall_from_initial_pct,
            ..
        } => info!(
            symbol = %event.instrument.symbol,
            price = %price,
            previous_alert_price = %previous_alert_price,
            cumulative_fall_pct = %cumulative_fall_from_initial_pct.round_dp(2),
            "Further decline below previous alert"
        ),
    }
}
