//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::common::errors::{MonitorError, Result};
use crate::common::types::Instrument;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Instruments to monitor, in summary order
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentConfig>,
    /// Drop thresholds
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Poll and summary cadences
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Market data source settings
    #[serde(default)]
    pub market_data: MarketDataConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            alerts: AlertConfig::default(),
            schedule: ScheduleConfig::default(),
            market_data: MarketDataConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

impl AppConfig {
    /// Check everything that must hold before the scheduler may start
    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(MonitorError::Configuration(
                "instrument list is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            let symbol = instrument.symbol.trim();
            if symbol.is_empty() {
                return Err(MonitorError::Configuration(format!(
                    "instrument '{}' has an empty symbol",
                    instrument.name
                )));
            }
            if !seen.insert(symbol.to_string()) {
                return Err(MonitorError::Configuration(format!(
                    "duplicate instrument symbol: {}",
                    symbol
                )));
            }
        }

        self.alerts.validate()?;

        if self.schedule.poll_interval_seconds == 0 {
            return Err(MonitorError::Configuration(
                "poll_interval_seconds must be positive".to_string(),
            ));
        }
        if self.schedule.summary_interval_seconds == 0 {
            return Err(MonitorError::Configuration(
                "summary_interval_seconds must be positive".to_string(),
            ));
        }
        if self.market_data.request_timeout_seconds == 0 {
            return Err(MonitorError::Configuration(
                "request_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.market_data.max_concurrent_fetches == 0 {
            return Err(MonitorError::Configuration(
                "max_concurrent_fetches must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Configured instruments as engine types
    pub fn instruments(&self) -> Vec<Instrument> {
        self.instruments
            .iter()
            .map(|i| {
                let symbol = i.symbol.trim();
                let name = match i.name.trim() {
                    "" => symbol,
                    name => name,
                };
                Instrument::new(symbol, name)
            })
            .collect()
    }
}

/// A single instrument entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Ticker symbol understood by the data source
    pub symbol: String,
    /// Display name; defaults to the symbol
    #[serde(default)]
    pub name: String,
}

impl InstrumentConfig {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let mut name = name.into();
        if name.is_empty() {
            name = symbol.clone();
        }
        Self { symbol, name }
    }

    /// Parse a `SYMBOL` or `SYMBOL=Display Name` CLI token
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match token.split_once('=') {
            Some((symbol, name)) => Some(Self::new(symbol.trim(), name.trim())),
            None => Some(Self::new(token, "")),
        }
    }
}

fn default_instruments() -> Vec<InstrumentConfig> {
    [
        ("HDFCBANK.NS", "HDFC Bank Ltd."),
        ("ICICIBANK.NS", "ICICI Bank Ltd."),
        ("RELIANCE.NS", "Reliance Industries Ltd."),
        ("INFY.NS", "Infosys Ltd."),
        ("BHARTIARTL.NS", "Bharti Airtel Ltd."),
        ("LT.NS", "Larsen & Toubro Ltd."),
        ("ITC.NS", "ITC Ltd."),
        ("TCS.NS", "Tata Consultancy Services Ltd."),
        ("AXISBANK.NS", "Axis Bank Ltd."),
        ("SBIN.NS", "State Bank of India"),
    ]
    .into_iter()
    .map(|(symbol, name)| InstrumentConfig::new(symbol, name))
    .collect()
}

/// Drop thresholds, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Tier-1 threshold below the reference high
    #[serde(default = "default_initial_drop_pct")]
    pub initial_drop_pct: Decimal,
    /// Tier-2 step below the previous alert price
    #[serde(default = "default_step_drop_pct")]
    pub step_drop_pct: Decimal,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            initial_drop_pct: default_initial_drop_pct(),
            step_drop_pct: default_step_drop_pct(),
        }
    }
}

impl AlertConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("initial_drop_pct", self.initial_drop_pct),
            ("step_drop_pct", self.step_drop_pct),
        ] {
            if value <= Decimal::ZERO || value >= dec!(100) {
                return Err(MonitorError::Configuration(format!(
                    "{} must be within (0, 100), got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

fn default_initial_drop_pct() -> Decimal {
    dec!(20)
}

fn default_step_drop_pct() -> Decimal {
    dec!(1)
}

/// Poll and summary cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Interval between sweep starts
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Minimum time between summary reports
    #[serde(default = "default_summary_interval")]
    pub summary_interval_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            summary_interval_seconds: default_summary_interval(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_seconds)
    }
}

fn default_poll_interval() -> u64 {
    60
}

fn default_summary_interval() -> u64 {
    300
}

/// Market data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Base URL of the Yahoo Finance query API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Fetches allowed in flight during one sweep (1 = sequential)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            user_agent: default_user_agent(),
        }
    }
}

impl MarketDataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_concurrent_fetches() -> usize {
    1
}

fn default_user_agent() -> String {
    format!("dropwatch/{}", env!("CARGO_PKG_VERSION"))
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Currency symbol used by the console renderer
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}
