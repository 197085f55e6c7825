//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use dropwatch::common::errors::{MonitorError, Result};
use dropwatch::common::traits::{EventSink, MarketDataSource};
use dropwatch::common::types::{AlertEvent, Instrument, MonitorEvent, Quote, SummaryReport};
use dropwatch::config::types::AlertConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// One scripted response of the fake market source
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this price with the given reference high
    Price(Decimal, Decimal),
    NotFound,
    Unavailable,
    /// Answer with this price only after the delay has passed
    Slow(Duration, Decimal, Decimal),
    /// Never answer within any sane timeout
    Hang,
}

/// Market source that replays a per-symbol script
///
/// Steps are consumed in order; the last step repeats forever.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<HashMap<String, usize>>,
    fetch_starts: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, symbol: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(symbol.to_string(), steps.into());
        self
    }

    /// Script of plain prices against a fixed reference high
    pub fn with_prices(self, symbol: &str, high: Decimal, prices: &[Decimal]) -> Self {
        let steps = prices.iter().map(|p| Step::Price(*p, high)).collect();
        self.with_script(symbol, steps)
    }

    pub fn calls(&self, symbol: &str) -> usize {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    /// Clock reading at the start of every fetch, across all symbols
    pub fn fetch_starts(&self) -> Vec<Instant> {
        self.fetch_starts.lock().unwrap().clone()
    }

    fn next_step(&self, symbol: &str) -> Option<Step> {
        self.fetch_starts.lock().unwrap().push(Instant::now());
        *self
            .calls
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(symbol)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl MarketDataSource for ScriptedSource {
    async fn fetch(&self, instrument: &Instrument) -> Result<Quote> {
        match self.next_step(&instrument.symbol) {
            Some(Step::Price(price, high)) => Ok(Quote::new(price, high)),
            Some(Step::NotFound) | None => Err(MonitorError::NotFound(instrument.symbol.clone())),
            Some(Step::Unavailable) => Err(MonitorError::Unavailable("scripted outage".into())),
            Some(Step::Slow(delay, price, high)) => {
                tokio::time::sleep(delay).await;
                Ok(Quote::new(price, high))
            }
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(MonitorError::Unavailable("woke from hang".into()))
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sink that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::Alert(alert) => Some(alert),
                MonitorEvent::Summary(_) => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<SummaryReport> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::Summary(report) => Some(report),
                MonitorEvent::Alert(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: MonitorEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Default thresholds: 20% initial, 1% step
pub fn thresholds() -> AlertConfig {
    AlertConfig {
        initial_drop_pct: dec!(20),
        step_drop_pct: dec!(1),
    }
}

pub fn sample_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("HDFCBANK.NS", "HDFC Bank Ltd."),
        Instrument::new("INFY.NS", "Infosys Ltd."),
        Instrument::new("ITC.NS", "ITC Ltd."),
    ]
}

/// Sample API responses for testing
pub mod api_responses {
    /// Chart response for INFY.NS, 25% below its 52-week high
    pub const INFY_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "INR",
                    "symbol": "INFY.NS",
                    "regularMarketPrice": 1500.0,
                    "fiftyTwoWeekHigh": 2000.0,
                    "fiftyTwoWeekLow": 1300.0
                }
            }],
            "error": null
        }
    }"#;

    /// Chart response without a 52-week high
    pub const MISSING_HIGH: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "INFY.NS", "regularMarketPrice": 1500.0}
            }],
            "error": null
        }
    }"#;

    /// Error body Yahoo sends for unknown symbols
    pub const NOT_FOUND: &str = r#"{
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    }"#;
}
