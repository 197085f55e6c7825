//! Yahoo Finance chart API message types

use serde::{Deserialize, Serialize};

/// Top-level chart response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

/// Result/error envelope; exactly one side is normally populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

/// A single symbol's chart payload. Only the metadata block is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
}

/// Quote metadata returned alongside chart data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub regular_market_time: Option<i64>,
}

/// Error block, e.g. `{"code": "Not Found", "description": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ChartError {
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("not found")
    }
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "{}: {}", self.code, desc),
            None => write!(f, "{}", self.code),
        }
    }
}
