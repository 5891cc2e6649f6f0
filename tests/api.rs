//! HTTP surface tests: status-code mapping, response bodies, and the
//! cache-disabling headers on every response.

mod common;

use axum_test::TestServer;
use sealbox::api::{build_router, ApiState};
use serde_json::{json, Value};

async fn test_server() -> (TestServer, common::TestApp) {
    let app = common::test_app().await;
    let router = build_router(ApiState { secret_service: app.service.clone() });
    (TestServer::new(router).expect("start test server"), app)
}

fn assert_no_cache_headers(response: &axum_test::TestResponse) {
    assert_eq!(
        response.header("cache-control"),
        "no-cache, no-store, must-revalidate",
    );
    assert_eq!(response.header("pragma"), "no-cache");
    assert_eq!(response.header("expires"), "0");
}

#[tokio::test]
async fn create_and_read_roundtrip() {
    let (server, _app) = test_server().await;

    let created = server.post("/secret").json(&json!({ "secret": "hello" })).await;
    created.assert_status(axum::http::StatusCode::CREATED);
    assert_no_cache_headers(&created);

    let secret_key = created.json::<Value>()["secret_key"].as_str().unwrap().to_string();
    assert!(!secret_key.is_empty());

    let read = server.get(&format!("/secret/{}", secret_key)).await;
    read.assert_status_ok();
    assert_no_cache_headers(&read);
    read.assert_json(&json!({ "secret": "hello" }));

    // One-time: the secret is gone after the first read
    let again = server.get(&format!("/secret/{}", secret_key)).await;
    again.assert_status_not_found();
    assert_no_cache_headers(&again);
    assert_eq!(again.json::<Value>()["error"], "not_found");
}

#[tokio::test]
async fn read_unknown_token_is_not_found() {
    let (server, _app) = test_server().await;

    let response = server.get("/secret/eb7b8d4f-0000-0000-0000-000000000000").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn create_rejects_invalid_bodies() {
    let (server, _app) = test_server().await;

    let empty_secret = server.post("/secret").json(&json!({ "secret": "" })).await;
    empty_secret.assert_status_bad_request();
    assert_eq!(empty_secret.json::<Value>()["error"], "bad_request");

    let zero_ttl =
        server.post("/secret").json(&json!({ "secret": "x", "ttl_seconds": 0 })).await;
    zero_ttl.assert_status_bad_request();

    let negative_ttl =
        server.post("/secret").json(&json!({ "secret": "x", "ttl_seconds": -5 })).await;
    negative_ttl.assert_status_bad_request();
}

#[tokio::test]
async fn delete_maps_passphrase_outcomes_to_statuses() {
    let (server, _app) = test_server().await;

    let created = server
        .post("/secret")
        .json(&json!({ "secret": "guarded", "passphrase": "open sesame" }))
        .await;
    let secret_key = created.json::<Value>()["secret_key"].as_str().unwrap().to_string();

    let wrong = server.delete(&format!("/secret/{}?passphrase=wrong", secret_key)).await;
    wrong.assert_status_forbidden();
    assert_eq!(wrong.json::<Value>()["error"], "forbidden");

    let missing = server.delete(&format!("/secret/{}", secret_key)).await;
    missing.assert_status_forbidden();

    let correct =
        server.delete(&format!("/secret/{}?passphrase=open%20sesame", secret_key)).await;
    correct.assert_status_ok();
    correct.assert_json(&json!({ "status": "secret_deleted" }));
    assert_no_cache_headers(&correct);

    let repeat =
        server.delete(&format!("/secret/{}?passphrase=open%20sesame", secret_key)).await;
    repeat.assert_status_not_found();
}

#[tokio::test]
async fn delete_unknown_token_is_not_found() {
    let (server, _app) = test_server().await;

    let response = server.delete("/secret/unknown-token").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn expired_secret_is_indistinguishable_from_absent() {
    let (server, _app) = test_server().await;

    let created = server
        .post("/secret")
        .json(&json!({ "secret": "fleeting", "ttl_seconds": 1 }))
        .await;
    let secret_key = created.json::<Value>()["secret_key"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let expired = server.get(&format!("/secret/{}", secret_key)).await;
    expired.assert_status_not_found();

    let absent = server.get("/secret/never-issued").await;
    absent.assert_status_not_found();

    // Same error body for both outcomes
    assert_eq!(expired.json::<Value>()["error"], absent.json::<Value>()["error"]);
}

#[tokio::test]
async fn forwarded_client_ip_lands_in_audit_trail() {
    let (server, app) = test_server().await;

    use axum::http::{HeaderName, HeaderValue};

    server
        .post("/secret")
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("203.0.113.42"),
        )
        .json(&json!({ "secret": "traced" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let events = app.audit.repository().list_recent(1).await.unwrap();
    assert_eq!(events[0].action, "create");
    assert_eq!(events[0].ip_address.as_deref(), Some("203.0.113.42"));
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (server, _app) = test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
    assert_no_cache_headers(&response);
}
