//! Tiered drop-alert decision logic
//!
//! ```text
//!            price <= high * (1 - initial%)
//!   Armed ───────────────────────────────────► Fired (tier-1 alert)
//!                                                │
//!        price <= last_alert * (1 - step%)       │  price > last_alert * (1 + step%)
//!        ──► tier-2 alert, ratchet baseline down │  ──► silent baseline reset
//! ```
//!
//! Exactly one tier is evaluated per call, so a single observation yields at
//! most one alert and tier-1 always takes priority.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::state::InstrumentState;
use crate::common::types::AlertKind;
use crate::config::types::AlertConfig;

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// State to write back
    pub state: InstrumentState,
    /// Alert to emit, if any
    pub alert: Option<AlertKind>,
}

/// Which branch of the tier logic applies to an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// Tier-1 not fired yet
    Armed,
    /// Tier-1 fired; watching for further declines or recoveries
    Tracking {
        initial_drop_price: Decimal,
        last_alert_price: Decimal,
    },
}

impl Tier {
    /// The latch decides the tier; missing prices fall back to the nearest
    /// known baseline so a fired instrument never re-arms.
    fn of(state: &InstrumentState) -> Self {
        if !state.initial_drop_fired {
            return Tier::Armed;
        }
        let initial_drop_price = state
            .initial_drop_price
            .or(state.last_alert_price)
            .unwrap_or(state.last_price);
        let last_alert_price = state.last_alert_price.unwrap_or(initial_drop_price);
        Tier::Tracking {
            initial_drop_price,
            last_alert_price,
        }
    }
}

/// Evaluate one price observation
///
/// `reference_high` only seeds fresh state. Once an instrument has state,
/// its stored reference high stays the baseline for the rest of the run.
pub fn evaluate(
    state: Option<&InstrumentState>,
    current_price: Decimal,
    reference_high: Decimal,
    thresholds: &AlertConfig,
) -> Evaluation {
    let mut next = match state {
        Some(existing) => *existing,
        None => InstrumentState::new(reference_high, current_price),
    };

    let alert = match Tier::of(&next) {
        Tier::Armed => check_initial_drop(&mut next, current_price, thresholds.initial_drop_pct),
        Tier::Tracking {
            initial_drop_price,
            last_alert_price,
        } => {
            next.initial_drop_price = Some(initial_drop_price);
            next.last_alert_price = Some(last_alert_price);
            check_step(
                &mut next,
                current_price,
                initial_drop_price,
                last_alert_price,
                thresholds.step_drop_pct,
            )
        }
    };

    next.last_price = current_price;
    Evaluation { state: next, alert }
}

/// Price at which an instrument is `pct` percent below `base`
pub fn threshold_price(base: Decimal, pct: Decimal) -> Decimal {
    base * (Decimal::ONE - pct / dec!(100))
}

/// Percentage fall from `from` down to `to`
pub fn percent_fall(from: Decimal, to: Decimal) -> Decimal {
    from.checked_sub(to)
        .and_then(|fall| fall.checked_div(from))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or(Decimal::ZERO)
}

fn check_initial_drop(
    state: &mut InstrumentState,
    price: Decimal,
    initial_pct: Decimal,
) -> Option<AlertKind> {
    let threshold = threshold_price(state.reference_high, initial_pct);
    if price > threshold {
        return None;
    }

    state.initial_drop_fired = true;
    state.initial_drop_price = Some(price);
    state.last_alert_price = Some(price);

    Some(AlertKind::InitialDrop {
        price,
        reference_high: state.reference_high,
        threshold_price: threshold,
        threshold_pct: initial_pct,
    })
}

fn check_step(
    state: &mut InstrumentState,
    price: Decimal,
    initial_drop_price: Decimal,
    last_alert_price: Decimal,
    step_pct: Decimal,
) -> Option<AlertKind> {
    if price < last_alert_price {
        let next_threshold = threshold_price(last_alert_price, step_pct);
        if price > next_threshold {
            return None;
        }

        state.last_alert_price = Some(price);
        return Some(AlertKind::IncrementalDrop {
            price,
            previous_alert_price: last_alert_price,
            step_pct,
            fall_from_previous_pct: percent_fall(last_alert_price, price),
            cumulative_fall_from_initial_pct: percent_fall(initial_drop_price, price),
        });
    }

    // Recovery beyond one step: move the baseline up without alerting
    let recovery_level = last_alert_price.checked_mul(Decimal::ONE + step_pct / dec!(100));
    if matches!(recovery_level, Some(level) if price > level) {
        state.last_alert_price = Some(price);
    }
    None
}
