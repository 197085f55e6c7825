//! Output collaborators for alerts and summaries

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::common::errors::{MonitorError, Result};
use crate::common::traits::EventSink;
use crate::common::types::{AlertEvent, AlertKind, MonitorEvent};

/// Forwards events onto an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<MonitorEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<MonitorEvent>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: MonitorEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|e| MonitorError::ChannelSend(e.to_string()))
    }
}

/// Prints alert blocks and summary tables to stdout
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    currency: String,
}

impl ConsoleSink {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

#[async_trait]
impl EventSink for ConsoleSink {
    async fn emit(&self, event: MonitorEvent) -> Result<()> {
        match event {
            MonitorEvent::Alert(alert) => println!("\n{}", render_alert(&alert, &self.currency)),
            MonitorEvent::Summary(report) => println!("\n{}", report.table(&self.currency)),
        }
        Ok(())
    }
}

/// Delivers every event to each inner sink
///
/// A failing sink does not stop delivery to the others; the first error is
/// returned once all sinks have been tried.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for FanoutSink {
    async fn emit(&self, event: MonitorEvent) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event.clone()).await {
                warn!(error = %e, "Sink rejected event");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Human-readable alert block
pub fn render_alert(alert: &AlertEvent, currency: &str) -> String {
    let instrument = &alert.instrument;
    match &alert.kind {
        AlertKind::InitialDrop {
            price,
            reference_high,
            threshold_price,
            threshold_pct,
        } => format!(
            "--- ALERT! {} ---\n\
             Current Price: {}{:.2}\n\
             52-Week High: {}{:.2}\n\
             Price is {}% down from its 52-week high ({}{:.2}).",
            instrument,
            currency,
            price,
            currency,
            reference_high,
            threshold_pct.normalize(),
            currency,
            threshold_price,
        ),
        AlertKind::IncrementalDrop {
            price,
            previous_alert_price,
            step_pct,
            cumulative_fall_from_initial_pct,
            ..
        } => format!(
            "--- UPDATE! {} ---\n\
             Current Price: {}{:.2}\n\
             Price has fallen another {}% from {}{:.2}.\n\
             Total fall from initial alert level: {:.2}%",
            instrument,
            currency,
            price,
            step_pct.normalize(),
            currency,
            previous_alert_price,
            cumulative_fall_from_initial_pct,
        ),
    }
}
