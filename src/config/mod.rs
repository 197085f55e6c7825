//! Configuration surface: types, defaults, loading and validation

pub mod loader;
pub mod types;

pub use loader::{load_config, load_from_str};
pub use types::{AlertConfig, AppConfig, AppSettings, InstrumentConfig, MarketDataConfig, ScheduleConfig};
