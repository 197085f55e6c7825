//! Integration tests for the Yahoo Finance chart client
//!
//! Every test runs against a local wiremock server, so no network access is
//! needed and failure modes can be forced deterministically.

mod common;

use common::{api_responses, thresholds, RecordingSink};
use dropwatch::common::errors::MonitorError;
use dropwatch::common::traits::{EventSink, MarketDataSource};
use dropwatch::common::types::Instrument;
use dropwatch::engine::{PollCycle, StateStore};
use dropwatch::yahoo::YahooChartClient;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn infy() -> Instrument {
    Instrument::new("INFY.NS", "Infosys Ltd.")
}

async fn mount(server: &MockServer, symbol: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/v8/finance/chart/{}", symbol)))
        .and(query_param("range", "1d"))
        .and(query_param("interval", "1d"))
        .respond_with(response)
        .mount(server)
        .await;
}

// ============================================================================
// Successful fetches
// ============================================================================

#[tokio::test]
async fn test_fetch_quote() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(200).set_body_string(api_responses::INFY_CHART),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).expect("Failed to create client");
    let quote = assert_ok!(client.fetch(&infy()).await);

    assert_eq!(quote.price, dec!(1500));
    assert_eq!(quote.reference_high, dec!(2000));
}

#[tokio::test]
async fn test_default_user_agent_is_sent() {
    let server = MockServer::start().await;
    let agent = format!("dropwatch/{}", env!("CARGO_PKG_VERSION"));
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/INFY.NS"))
        .and(header("user-agent", agent.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(api_responses::INFY_CHART))
        .expect(1)
        .mount(&server)
        .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    assert_ok!(client.fetch(&infy()).await);
}

#[test_log::test(tokio::test)]
async fn test_poll_cycle_with_yahoo_source() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(200).set_body_string(api_responses::INFY_CHART),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(StateStore::new());
    let cycle = PollCycle::new(
        vec![infy()],
        Arc::new(client) as Arc<dyn MarketDataSource>,
        store.clone(),
        sink.clone() as Arc<dyn EventSink>,
        thresholds(),
    );

    let report = cycle.preload().await;
    assert_eq!(report.fetched, 1);
    assert_eq!(report.alerts, 1);

    let alerts = sink.alerts();
    assert_eq!(alerts[0].instrument.name, "Infosys Ltd.");
    assert_eq!(alerts[0].kind.price(), dec!(1500));
    assert_eq!(store.get("INFY.NS").await.unwrap().reference_high, dec!(2000));
}

// ============================================================================
// Failure classification
// ============================================================================

#[tokio::test]
async fn test_http_404_is_not_found() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(404).set_body_string(api_responses::NOT_FOUND),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(matches!(err, MonitorError::NotFound(ref s) if s == "INFY.NS"));
}

#[tokio::test]
async fn test_error_body_is_not_found() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(200).set_body_string(api_responses::NOT_FOUND),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(matches!(err, MonitorError::NotFound(_)));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(503).set_body_string("overloaded"),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(matches!(err, MonitorError::Unavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_missing_field_is_malformed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(200).set_body_string(api_responses::MISSING_HIGH),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(matches!(err, MonitorError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"),
    )
    .await;

    let client = YahooChartClient::new(&server.uri()).unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(matches!(err, MonitorError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;
    mount(
        &server,
        "INFY.NS",
        ResponseTemplate::new(200)
            .set_body_string(api_responses::INFY_CHART)
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let client =
        YahooChartClient::with_timeout(&server.uri(), Duration::from_millis(200), "dropwatch-test")
            .unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(matches!(err, MonitorError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_transient() {
    // Bind and release a port so nothing listens on it
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let client = YahooChartClient::new(&uri).unwrap();
    let err = assert_err!(client.fetch(&infy()).await);
    assert!(err.is_transient(), "got {:?}", err);
}
