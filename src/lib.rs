//! Dropwatch Library
//!
//! Polls a fixed set of instruments and raises tiered alerts when a price
//! falls a configured percentage below its 52-week high, then again for every
//! further step down.

pub mod common;
pub mod config;
pub mod engine;
pub mod yahoo;

// Re-export commonly used types
pub use common::errors::{MonitorError, Result};
pub use common::traits::{EventSink, MarketDataSource};
pub use common::types::{
    AlertEvent, AlertKind, Instrument, MonitorEvent, Quote, RowStatus, SummaryReport, SummaryRow,
};
pub use crate::config::types::AppConfig;
pub use engine::{
    evaluate, ChannelSink, ConsoleSink, FanoutSink, InstrumentState, PollCycle, Scheduler,
    SchedulerPhase, StateStore, SummaryReporter, SweepReport,
};
pub use yahoo::YahooChartClient;
