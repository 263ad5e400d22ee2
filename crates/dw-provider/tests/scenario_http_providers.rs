use std::time::Duration;

use dw_core::{DateType, Record};
use dw_provider::*;
use httpmock::prelude::*;
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(10);

fn dates(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.date_str()).collect()
}

// ---------------------------------------------------------------------------
// date.nager.at
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_nager_fetches_two_years_and_filters_region() {
    let server = MockServer::start_async().await;

    let y2024 = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/publicholidays/2024/DE");
            then.status(200).json_body(json!([
                {"date": "2024-01-01", "localName": "Neujahr", "name": "New Year's Day",
                 "type": "Public", "counties": null},
                {"date": "2024-01-06", "localName": "Heilige Drei Könige", "name": "Epiphany",
                 "type": "Public", "counties": ["DE-BW", "DE-BY", "DE-ST"]},
                {"date": "2024-03-08", "localName": "Frauentag", "name": "Women's Day",
                 "type": "Public", "counties": ["DE-BE"]},
                {"date": "2024-10-31", "localName": "Reformationstag", "name": "Reformation Day",
                 "type": "Observance", "counties": null}
            ]));
        })
        .await;
    let y2025 = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/publicholidays/2025/DE");
            then.status(200).json_body(json!([
                {"date": "2025-01-01", "localName": "Neujahr", "name": "New Year's Day",
                 "type": "Public", "counties": []}
            ]));
        })
        .await;

    let api = ApiConfig {
        provider: NAGER.to_string(),
        country: "de".to_string(),
        region: "de-by".to_string(),
        ..ApiConfig::default()
    };
    let endpoints = Endpoints {
        nager: server.base_url(),
        ..Endpoints::default()
    };
    let provider = provider_for(&api, &endpoints).unwrap();
    let out = fetch_candidates(provider.as_ref(), 2024, TIMEOUT).await;

    y2024.assert_async().await;
    y2025.assert_async().await;
    assert!(out.is_ok());
    assert_eq!(out.status, STATUS_OK);
    assert_eq!(dates(&out.candidates), ["2024-01-01", "2024-01-06", "2025-01-01"]);
    assert_eq!(out.candidates[1].reason, "Heilige Drei Könige");
    assert!(out
        .candidates
        .iter()
        .all(|r| r.date_type == DateType::Holiday && r.source == NAGER));
}

#[tokio::test]
async fn scenario_nager_http_error_becomes_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/publicholidays/2024/DE");
            then.status(500);
        })
        .await;

    let provider = NagerProvider::new_with_base_url("DE", "DE-BY", server.base_url());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(out.candidates.is_empty());
    assert_eq!(out.status, "api response status: 500 - Internal Server Error");
}

#[tokio::test]
async fn scenario_second_year_failure_discards_first_year() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/publicholidays/2024/AT");
            then.status(200).json_body(json!([
                {"date": "2024-12-25", "localName": "Christtag", "type": "Public"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/publicholidays/2025/AT");
            then.status(404);
        })
        .await;

    let provider = NagerProvider::new_with_base_url("AT", "AT-9", server.base_url());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(out.candidates.is_empty());
    assert_eq!(out.status, "api response status: 404 - Not Found");
}

#[tokio::test]
async fn scenario_nager_garbage_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/publicholidays/2024/DE");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let provider = NagerProvider::new_with_base_url("DE", "DE-BY", server.base_url());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(out.candidates.is_empty());
    assert!(matches!(out.error, Some(ProviderError::Decode(_))));
}

// ---------------------------------------------------------------------------
// calendarific.com
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_calendarific_sends_key_and_trims_iso_dates() {
    let server = MockServer::start_async().await;

    let y2024 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/holidays")
                .query_param("api_key", "test-key")
                .query_param("type", "national")
                .query_param("country", "US")
                .query_param("year", "2024");
            then.status(200).json_body(json!({
                "meta": {"code": 200},
                "response": {"holidays": [
                    {"name": "Independence Day", "date": {"iso": "2024-07-04"}},
                    {"name": "Daylight Saving Time ends", "date": {"iso": "2024-11-03T02:00:00-05:00"}}
                ]}
            }));
        })
        .await;
    let y2025 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/holidays")
                .query_param("year", "2025");
            then.status(200).json_body(json!({
                "meta": {"code": 200},
                "response": {"holidays": [
                    {"name": "New Year's Day", "date": {"iso": "2025-01-01"}}
                ]}
            }));
        })
        .await;

    let provider = CalendarificProvider::new_with_base_url("test-key", "US", server.base_url());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    y2024.assert_async().await;
    y2025.assert_async().await;
    assert_eq!(dates(&out.candidates), ["2024-07-04", "2024-11-03", "2025-01-01"]);
    assert_eq!(out.candidates[0].reason, "Independence Day");
    assert_eq!(out.candidates[0].source, CALENDARIFIC);
}

#[tokio::test]
async fn scenario_calendarific_error_envelope_reports_missing_dates() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/holidays");
            then.status(200).json_body(json!({
                "meta": {"code": 401, "error_type": "auth failed",
                         "error_detail": "Missing or invalid api credentials."},
                "response": []
            }));
        })
        .await;

    let provider = CalendarificProvider::new_with_base_url("bad", "US", server.base_url());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(out.candidates.is_empty());
    assert_eq!(out.status, "decode error: missing dates in response");
}

#[tokio::test]
async fn scenario_calendarific_garbage_body_status_omits_key() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/holidays");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let provider = CalendarificProvider::new_with_base_url("S3CRET-KEY", "US", server.base_url());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(matches!(out.error, Some(ProviderError::Decode(_))));
    assert!(out.status.starts_with("decode error:"));
    assert!(!out.status.contains("S3CRET-KEY"), "{}", out.status);
    assert!(!out.status.contains("api_key"), "{}", out.status);
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_unreachable_host_is_a_transport_error() {
    // Nothing listens on the discard port.
    let provider = NagerProvider::new_with_base_url("DE", "DE-BY", "http://127.0.0.1:9".to_string());
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(out.candidates.is_empty());
    assert!(matches!(out.error, Some(ProviderError::Transport(_))));
    assert!(out.status.starts_with("transport error:"));
}

#[tokio::test]
async fn scenario_calendarific_transport_status_omits_key() {
    let provider = CalendarificProvider::new_with_base_url(
        "S3CRET-KEY",
        "US",
        "http://127.0.0.1:9".to_string(),
    );
    let out = fetch_candidates(&provider, 2024, TIMEOUT).await;

    assert!(matches!(out.error, Some(ProviderError::Transport(_))));
    assert!(!out.status.contains("S3CRET-KEY"), "{}", out.status);
    assert!(!out.status.contains("api_key"), "{}", out.status);
    let logged = format!("{:?}", out.error);
    assert!(!logged.contains("S3CRET-KEY"), "{logged}");
}
