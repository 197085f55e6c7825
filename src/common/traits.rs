//! Trait definitions for the engine's collaborators

use async_trait::async_trait;

use super::errors::Result;
use super::types::{Instrument, MonitorEvent, Quote};

/// Trait for market data sources (Yahoo Finance, test doubles, ...)
///
/// Implementations perform a single request per call. Retrying is left to
/// the next scheduled sweep.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the current price and reference high for an instrument
    ///
    /// # Errors
    /// `NotFound`, `Timeout`, `MalformedResponse` or `Unavailable`
    async fn fetch(&self, instrument: &Instrument) -> Result<Quote>;

    /// Name of the source, for logs
    fn source_name(&self) -> &'static str;
}

/// Trait for receivers of alerts and summaries
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event. A failure is logged by the caller and never retried.
    async fn emit(&self, event: MonitorEvent) -> Result<()>;
}
