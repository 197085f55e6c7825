//! Per-instrument alert bookkeeping and the store that owns it

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Alert bookkeeping for one instrument
///
/// `initial_drop_price` and `last_alert_price` stay `None` until the tier-1
/// alert fires; from then on both are set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentState {
    /// Drop baseline, fixed at first observation
    pub reference_high: Decimal,
    /// Most recently observed price
    pub last_price: Decimal,
    /// One-way latch for the tier-1 alert
    pub initial_drop_fired: bool,
    /// Price at which the tier-1 alert fired
    pub initial_drop_price: Option<Decimal>,
    /// Baseline for the next tier-2 comparison
    pub last_alert_price: Option<Decimal>,
}

impl InstrumentState {
    /// Fresh state for a first observation
    pub fn new(reference_high: Decimal, last_price: Decimal) -> Self {
        Self {
            reference_high,
            last_price,
            initial_drop_fired: false,
            initial_drop_price: None,
            last_alert_price: None,
        }
    }
}

type Slot = Arc<Mutex<Option<InstrumentState>>>;

/// Owns the mapping from symbol to [`InstrumentState`]
///
/// Each symbol gets its own slot. The outer map lock is only held to find or
/// insert a slot, so updates to different instruments never contend, while
/// two updates to the same instrument are serialized by the slot mutex.
#[derive(Debug, Default)]
pub struct StateStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a symbol, if it has ever been observed
    pub async fn get(&self, symbol: &str) -> Option<InstrumentState> {
        let slot = self.slots.read().await.get(symbol).cloned()?;
        let state = *slot.lock().await;
        state
    }

    /// Insert or replace the state for a symbol
    pub async fn upsert(&self, symbol: &str, state: InstrumentState) {
        let slot = self.slot(symbol).await;
        *slot.lock().await = Some(state);
    }

    /// Read-modify-write under the instrument's lock
    ///
    /// `f` receives the current state (or `None`) and returns the new state
    /// plus a value handed back to the caller.
    pub async fn update<F, R>(&self, symbol: &str, f: F) -> R
    where
        F: FnOnce(Option<&InstrumentState>) -> (InstrumentState, R),
    {
        let slot = self.slot(symbol).await;
        let mut guard = slot.lock().await;
        let (next, out) = f(guard.as_ref());
        *guard = Some(next);
        out
    }

    /// Copy of every observed state
    pub async fn snapshot(&self) -> HashMap<String, InstrumentState> {
        let slots: Vec<(String, Slot)> = self
            .slots
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut out = HashMap::with_capacity(slots.len());
        for (symbol, slot) in slots {
            if let Some(state) = *slot.lock().await {
                out.insert(symbol, state);
            }
        }
        out
    }

    /// Number of instruments with state
    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn slot(&self, symbol: &str) -> Slot {
        if let Some(slot) = self.slots.read().await.get(symbol) {
            return slot.clone();
        }
        // Another writer may have inserted between the two locks
        self.slots
            .write()
            .await
            .entry(symbol.to_string())
            .or_default()
            .clone()
    }
}
