//! Error types for the application

use thiserror::Error;

/// Result type alias using our MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for the monitor and its collaborators
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The market data source does not know the symbol
    #[error("Instrument not found: {0}")]
    NotFound(String),

    /// A fetch did not complete within its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The response was received but lacked usable fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The data source could not be reached or refused to serve
    #[error("Market data unavailable: {0}")]
    Unavailable(String),

    /// HTTP request errors that do not fit a more specific kind
    #[error("HTTP request error: {0}")]
    HttpRequest(reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Channel send errors
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    /// Whether the error is a per-cycle fetch failure that the next sweep may clear
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitorError::NotFound(_)
                | MonitorError::Timeout(_)
                | MonitorError::MalformedResponse(_)
                | MonitorError::Unavailable(_)
                | MonitorError::HttpRequest(_)
                | MonitorError::JsonParse(_)
        )
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::Timeout(err.to_string())
        } else if err.is_decode() {
            MonitorError::MalformedResponse(err.to_string())
        } else if err.is_connect() {
            MonitorError::Unavailable(err.to_string())
        } else {
            MonitorError::HttpRequest(err)
        }
    }
}
