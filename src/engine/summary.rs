//! Read-only percent-below-high projection of the state store

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

use super::evaluator::percent_fall;
use super::state::{InstrumentState, StateStore};
use crate::common::types::{Instrument, RowStatus, SummaryReport, SummaryRow};

const NAME_WIDTH: usize = 30;
const PRICE_WIDTH: usize = 15;
const PCT_WIDTH: usize = 18;
const RULE_WIDTH: usize = NAME_WIDTH + 2 * PRICE_WIDTH + PCT_WIDTH + 9;

/// Builds summary reports in configured instrument order
#[derive(Debug, Clone)]
pub struct SummaryReporter {
    instruments: Vec<Instrument>,
}

impl SummaryReporter {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }

    /// Snapshot the store and render a report
    pub async fn report(&self, store: &StateStore) -> SummaryReport {
        let snapshot = store.snapshot().await;
        self.render(&snapshot)
    }

    /// Render a report from an existing snapshot
    pub fn render(&self, snapshot: &HashMap<String, InstrumentState>) -> SummaryReport {
        let rows = self
            .instruments
            .iter()
            .map(|instrument| SummaryRow {
                symbol: instrument.symbol.clone(),
                name: instrument.name.clone(),
                status: snapshot
                    .get(&instrument.symbol)
                    .map(row_status)
                    .unwrap_or(RowStatus::NotYetObserved),
            })
            .collect();

        SummaryReport {
            generated_at: Utc::now(),
            rows,
        }
    }
}

fn row_status(state: &InstrumentState) -> RowStatus {
    if state.reference_high <= Decimal::ZERO {
        return RowStatus::Unavailable;
    }
    RowStatus::Observed {
        current_price: state.last_price,
        reference_high: state.reference_high,
        percent_below_high: percent_fall(state.reference_high, state.last_price),
    }
}

impl SummaryReport {
    /// Fixed-width table, prices prefixed with `currency`
    pub fn table(&self, currency: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "--- Summary Report ({}) ---\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!(
            "{:<nw$} | {:>pw$} | {:>pw$} | {:>cw$}\n",
            "Name",
            "Current Price",
            "52-Week High",
            "% Down from High",
            nw = NAME_WIDTH,
            pw = PRICE_WIDTH,
            cw = PCT_WIDTH,
        ));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');

        for row in &self.rows {
            let line = match &row.status {
                RowStatus::Observed {
                    current_price,
                    reference_high,
                    percent_below_high,
                } => format!(
                    "{:<nw$} | {:>pw$} | {:>pw$} | {:>cw$}",
                    row.name,
                    money(currency, *current_price),
                    money(currency, *reference_high),
                    format!("{:.2}%", percent_below_high),
                    nw = NAME_WIDTH,
                    pw = PRICE_WIDTH,
                    cw = PCT_WIDTH,
                ),
                RowStatus::Unavailable => format!(
                    "{:<nw$} | {:>pw$} | {:>pw$} | {:>cw$}",
                    row.name,
                    "Data N/A",
                    "Data N/A",
                    "Data N/A",
                    nw = NAME_WIDTH,
                    pw = PRICE_WIDTH,
                    cw = PCT_WIDTH,
                ),
                RowStatus::NotYetObserved => {
                    format!("{:<nw$} | Not Monitored Yet", row.name, nw = NAME_WIDTH)
                }
            };
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str(&"-".repeat(RULE_WIDTH));
        out
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.table(""))
    }
}

fn money(currency: &str, value: Decimal) -> String {
    format!("{}{:.2}", currency, value)
}
