//! Health and metrics endpoint tests for crm-service.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Invalid health JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "crm-service");

    app.cleanup().await;
}

#[tokio::test]
async fn readiness_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::spawn().await;

    // Generate at least one recorded query
    let _ = app.get("/api/customers").await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.expect("Invalid metrics body");
    assert!(body.contains("crm_db_query_duration_seconds"));

    app.cleanup().await;
}
