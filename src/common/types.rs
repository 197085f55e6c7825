//! Unified types shared by the engine, the data sources and the sinks

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::errors::{MonitorError, Result};

/// A monitored instrument: ticker plus a human-readable name
///
/// Set at startup from configuration and immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker understood by the market data source (e.g. `HDFCBANK.NS`)
    pub symbol: String,
    /// Display name used in alerts and summaries
    pub name: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}

/// Largest price or reference high accepted from a data source
pub const MAX_QUOTE_VALUE: Decimal = dec!(1000000000000);

/// A single observation returned by the market data source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price
    pub price: Decimal,
    /// Reference high (52-week high) used as the drop baseline
    pub reference_high: Decimal,
}

impl Quote {
    pub fn new(price: Decimal, reference_high: Decimal) -> Self {
        Self {
            price,
            reference_high,
        }
    }

    /// Reject quotes the evaluator must never see
    pub fn validated(self, symbol: &str) -> Result<Self> {
        if self.price <= Decimal::ZERO {
            return Err(MonitorError::MalformedResponse(format!(
                "{}: non-positive price {}",
                symbol, self.price
            )));
        }
        if self.reference_high <= Decimal::ZERO {
            return Err(MonitorError::MalformedResponse(format!(
                "{}: non-positive reference high {}",
                symbol, self.reference_high
            )));
        }
        if self.price > MAX_QUOTE_VALUE || self.reference_high > MAX_QUOTE_VALUE {
            return Err(MonitorError::MalformedResponse(format!(
                "{}: implausible quote {} / {}",
                symbol, self.price, self.reference_high
            )));
        }
        Ok(self)
    }
}

/// What kind of threshold crossing an alert reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Tier-1: price crossed the initial drop threshold below the reference high
    InitialDrop {
        price: Decimal,
        reference_high: Decimal,
        threshold_price: Decimal,
        threshold_pct: Decimal,
    },
    /// Tier-2: price fell a further step below the previous alert price
    IncrementalDrop {
        price: Decimal,
        previous_alert_price: Decimal,
        step_pct: Decimal,
        fall_from_previous_pct: Decimal,
        cumulative_fall_from_initial_pct: Decimal,
    },
}

impl AlertKind {
    /// Price at which the alert fired
    pub fn price(&self) -> Decimal {
        match self {
            AlertKind::InitialDrop { price, .. } => *price,
            AlertKind::IncrementalDrop { price, .. } => *price,
        }
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, AlertKind::InitialDrop { .. })
    }
}

/// An alert bound to the instrument it was raised for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub instrument: Instrument,
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
}

/// Per-instrument status line of a summary report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    /// State exists and the percentage could be computed
    Observed {
        current_price: Decimal,
        reference_high: Decimal,
        percent_below_high: Decimal,
    },
    /// State exists but the reference high is unusable
    Unavailable,
    /// No successful fetch yet for this instrument
    NotYetObserved,
}

/// One row of a summary report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub symbol: String,
    pub name: String,
    pub status: RowStatus,
}

/// Periodic percent-below-high table, rows in configured instrument order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<SummaryRow>,
}

/// Everything the engine hands to the output collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MonitorEvent {
    Alert(AlertEvent),
    Summary(SummaryReport),
}

impl MonitorEvent {
    /// Symbol this event concerns, if it is instrument-specific
    pub fn symbol(&self) -> Option<&str> {
        match self {
            MonitorEvent::Alert(alert) => Some(&alert.instrument.symbol),
            MonitorEvent::Summary(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_validation_rejects_non_positive_values() {
        assert!(Quote::new(dec!(10), dec!(12)).validated("A").is_ok());
        assert!(matches!(
            Quote::new(dec!(0), dec!(12)).validated("A"),
            Err(MonitorError::MalformedResponse(_))
        ));
        assert!(matches!(
            Quote::new(dec!(10), dec!(-1)).validated("A"),
            Err(MonitorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_quote_validation_rejects_implausible_values() {
        assert!(Quote::new(MAX_QUOTE_VALUE, MAX_QUOTE_VALUE).validated("A").is_ok());
        assert!(matches!(
            Quote::new(dec!(70000000000000000000000000000), dec!(1)).validated("A"),
            Err(MonitorError::MalformedResponse(_))
        ));
        assert!(matches!(
            Quote::new(dec!(1), dec!(70000000000000000000000000000)).validated("A"),
            Err(MonitorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_alert_kind_serializes_with_tag() {
        let kind = AlertKind::InitialDrop {
            price: dec!(79),
            reference_high: dec!(100),
            threshold_price: dec!(80),
            threshold_pct: dec!(20),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "initial_drop");
        assert_eq!(kind.price(), dec!(79));
        assert!(kind.is_initial());
    }
}
