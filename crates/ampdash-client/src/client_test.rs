use serde_json::json;

use super::*;

fn test_client(base_url: &str) -> HttpUpstream {
    HttpUpstream::with_base_url(base_url, 30, "ampdash-test/0.1")
        .expect("client construction should not fail")
}

#[test]
fn call_url_appends_api_segment() {
    let client = test_client("http://localhost:3001");
    let url = client.call_url("getCampaigns").unwrap();
    assert_eq!(url.as_str(), "http://localhost:3001/api/getCampaigns");
}

#[test]
fn call_url_keeps_base_path() {
    let client = test_client("https://bridge.example.com/amplify/");
    let url = client.call_url("getMyMarketers").unwrap();
    assert_eq!(
        url.as_str(),
        "https://bridge.example.com/amplify/api/getMyMarketers"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = HttpUpstream::with_base_url("not a url", 30, "ua").unwrap_err();
    assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
}

#[test]
fn error_field_is_a_remote_failure() {
    let err = unwrap_envelope("getCampaigns", json!({ "error": "token expired" })).unwrap_err();
    assert!(
        matches!(err, ClientError::Api { ref message, .. } if message == "token expired"),
        "got {err:?}"
    );
}

#[test]
fn success_false_is_a_remote_failure() {
    let err = unwrap_envelope("changeBudget", json!({ "success": false })).unwrap_err();
    assert!(matches!(err, ClientError::Api { ref message, .. } if message == "unknown error"));
}

#[test]
fn data_envelope_is_unwrapped() {
    let payload = unwrap_envelope("getCampaigns", json!({ "success": true, "data": [1, 2] }))
        .unwrap();
    assert_eq!(payload, json!([1, 2]));
}

#[test]
fn bare_payload_passes_through() {
    let payload = unwrap_envelope("getReporting", json!({ "clicks": 3 })).unwrap();
    assert_eq!(payload, json!({ "clicks": 3 }));
}
