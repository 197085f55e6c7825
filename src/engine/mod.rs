//! Threshold alert engine
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐  tick   ┌───────────┐  fetch  ┌──────────────────┐
//! │ Scheduler │ ──────► │ PollCycle │ ──────► │ MarketDataSource │
//! └───────────┘         └───────────┘         └──────────────────┘
//!       │                     │
//!       │ summary due         │ evaluate (per instrument, under its lock)
//!       ▼                     ▼
//! ┌─────────────────┐   ┌────────────┐        ┌───────────┐
//! │ SummaryReporter │◄──│ StateStore │        │ EventSink │◄── alerts, summaries
//! └─────────────────┘   └────────────┘        └───────────┘
//! ```
//!
//! # Components
//!
//! - [`InstrumentState`] / [`StateStore`]: per-instrument bookkeeping
//! - [`evaluate`]: pure tier-1 / tier-2 decision function
//! - [`PollCycle`]: one fetch-evaluate-update sweep
//! - [`Scheduler`]: poll and summary cadences, cooperative shutdown
//! - [`SummaryReporter`]: percent-below-high table
//! - [`ChannelSink`], [`ConsoleSink`], [`FanoutSink`]: output collaborators

pub mod evaluator;
pub mod poll;
pub mod scheduler;
pub mod sink;
pub mod state;
pub mod summary;

pub use evaluator::{evaluate, percent_fall, threshold_price, Evaluation};
pub use poll::{InstrumentOutcome, PollCycle, SweepReport, DEFAULT_FETCH_TIMEOUT};
pub use scheduler::{Scheduler, SchedulerPhase, SummaryCadence};
pub use sink::{render_alert, ChannelSink, ConsoleSink, FanoutSink};
pub use state::{InstrumentState, StateStore};
pub use summary::SummaryReporter;
