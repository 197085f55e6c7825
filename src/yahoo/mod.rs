//! Yahoo module - market data source backed by the Yahoo Finance chart API

pub mod client;
pub mod messages;

pub use client::YahooChartClient;
