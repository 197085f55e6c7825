//! REST client for the Yahoo Finance chart endpoint

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::messages::{ChartMeta, ChartResponse};
use crate::common::errors::{MonitorError, Result};
use crate::common::traits::MarketDataSource;
use crate::common::types::{Instrument, Quote};
use crate::config::types::MarketDataConfig;

/// Market data source backed by `GET /v8/finance/chart/{symbol}`
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    /// HTTP client
    client: Client,
    /// Base URL, without trailing slash
    base_url: Url,
}

impl YahooChartClient {
    /// Create a client with the default timeout and user agent
    pub fn new(base_url: &str) -> Result<Self> {
        let defaults = MarketDataConfig::default();
        Self::with_timeout(base_url, defaults.request_timeout(), &defaults.user_agent)
    }

    /// Create a client from the market data configuration
    pub fn from_config(config: &MarketDataConfig) -> Result<Self> {
        Self::with_timeout(&config.base_url, config.request_timeout(), &config.user_agent)
    }

    /// Create a client with custom timeout and user agent
    pub fn with_timeout(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| MonitorError::Internal(e.to_string()))?;

        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            MonitorError::Configuration(format!("Invalid market data URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MonitorError::Configuration(format!(
                "Market data URL cannot be a base: {}",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Build the chart URL for a symbol; the symbol is percent-encoded as a path segment
    pub fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(&["v8", "finance", "chart", symbol]);
        }
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", "1d");
        url
    }

    /// Fetch the raw chart metadata for a symbol
    #[instrument(skip(self))]
    pub async fn get_chart_meta(&self, symbol: &str) -> Result<ChartMeta> {
        let url = self.chart_url(symbol);
        debug!("Fetching chart from: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(MonitorError::NotFound(symbol.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Unavailable(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let chart: ChartResponse = serde_json::from_str(&body)
            .map_err(|e| MonitorError::MalformedResponse(format!("{}: {}", symbol, e)))?;

        if let Some(error) = chart.chart.error {
            if error.is_not_found() {
                return Err(MonitorError::NotFound(symbol.to_string()));
            }
            return Err(MonitorError::Unavailable(format!("{}: {}", symbol, error)));
        }

        chart
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|r| r.meta)
            .ok_or_else(|| MonitorError::MalformedResponse(format!("{}: empty chart result", symbol)))
    }
}

#[async_trait]
impl MarketDataSource for YahooChartClient {
    async fn fetch(&self, instrument: &Instrument) -> Result<Quote> {
        let meta = self.get_chart_meta(&instrument.symbol).await?;
        quote_from_meta(&instrument.symbol, &meta)
    }

    fn source_name(&self) -> &'static str {
        "yahoo"
    }
}

/// Extract price and 52-week high, rejecting missing or non-positive values
pub fn quote_from_meta(symbol: &str, meta: &ChartMeta) -> Result<Quote> {
    let price = to_decimal(symbol, "regularMarketPrice", meta.regular_market_price)?;
    let high = to_decimal(symbol, "fiftyTwoWeekHigh", meta.fifty_two_week_high)?;
    Quote::new(price, high).validated(symbol)
}

fn to_decimal(symbol: &str, field: &str, value: Option<f64>) -> Result<Decimal> {
    let value = value.ok_or_else(|| {
        MonitorError::MalformedResponse(format!("{}: missing {}", symbol, field))
    })?;
    Decimal::from_f64(value).ok_or_else(|| {
        MonitorError::MalformedResponse(format!("{}: unrepresentable {} {}", symbol, field, value))
    })
}
