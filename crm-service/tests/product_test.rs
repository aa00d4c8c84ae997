//! Product integration tests for crm-service.

mod common;

use common::{decimal_field, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn create_and_get_product() {
    let app = TestApp::spawn().await;

    let product = app.create_product("4481798190", 23, "1500.00").await;
    let id = product["product_id"].as_str().unwrap();

    let response = app.get(&format!("/api/products/{}", id)).await;
    assert_eq!(response.status(), 200);

    let fetched: serde_json::Value = response.json().await.unwrap();
    assert_eq!(fetched["code"], "4481798190");
    assert_eq!(fetched["stock"], 23);
    assert_eq!(decimal_field(&fetched, "price"), Decimal::new(150000, 2));

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_code_is_rejected() {
    let app = TestApp::spawn().await;

    app.create_product("DUP-1", 5, "10.00").await;

    let response = app
        .post_json(
            "/api/products",
            &json!({
                "code": "DUP-1",
                "brand": "Other",
                "description": "Duplicate code",
                "price": "12.00"
            }),
        )
        .await;
    assert_eq!(response.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn update_cannot_touch_stock_or_price() {
    let app = TestApp::spawn().await;

    let product = app.create_product("SAFE-1", 10, "100.00").await;
    let id = product["product_id"].as_str().unwrap();

    // stock/price in the body are unknown fields for the update DTO and are
    // dropped; only the audited paths may change them.
    let response = app
        .put_json(
            &format!("/api/products/{}", id),
            &json!({
                "brand": "Renamed",
                "stock": 999,
                "price": "9999.00"
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["brand"], "Renamed");
    assert_eq!(updated["stock"], 10);
    assert_eq!(decimal_field(&updated, "price"), Decimal::new(10000, 2));

    app.cleanup().await;
}

#[tokio::test]
async fn low_stock_alerts_report_shortage() {
    let app = TestApp::spawn().await;

    let product = app.create_product("LOW-1", 2, "10.00").await;
    let id = product["product_id"].as_str().unwrap();
    app.create_product("OK-1", 50, "10.00").await;

    let response = app
        .put_json(
            &format!("/api/products/{}/minimum-stock", id),
            &json!({ "minimum_stock": 5 }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let alerts: Vec<serde_json::Value> =
        app.get("/api/products/alerts").await.json().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["code"], "LOW-1");
    assert_eq!(alerts[0]["shortage"], 3);

    app.cleanup().await;
}

#[tokio::test]
async fn expiring_products_respect_window() {
    let app = TestApp::spawn().await;

    let soon = chrono::Utc::now().date_naive() + chrono::Duration::days(10);
    let response = app
        .post_json(
            "/api/products",
            &json!({
                "code": "EXP-1",
                "brand": "Roche",
                "description": "Expiring reagent",
                "price": "25.00",
                "expiry_date": soon.to_string()
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let within: Vec<serde_json::Value> = app
        .get("/api/products/expiring?days=30")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(within.len(), 1);
    assert_eq!(within[0]["code"], "EXP-1");

    let outside: Vec<serde_json::Value> = app
        .get("/api/products/expiring?days=5")
        .await
        .json()
        .await
        .unwrap();
    assert!(outside.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn minimum_stock_bulk_is_atomic() {
    let app = TestApp::spawn().await;

    let product = app.create_product("MIN-1", 10, "10.00").await;
    let id = product["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/stock/minimum-bulk",
            &json!({
                "updates": [
                    { "product_id": id, "minimum_stock": 8 },
                    { "product_id": uuid::Uuid::new_v4(), "minimum_stock": 3 }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    let fetched: serde_json::Value = app
        .get(&format!("/api/products/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["minimum_stock"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn delete_is_soft_and_hides_product() {
    let app = TestApp::spawn().await;

    let product = app.create_product("GONE-1", 5, "10.00").await;
    let id = product["product_id"].as_str().unwrap();

    assert_eq!(app.delete(&format!("/api/products/{}", id)).await.status(), 204);
    assert_eq!(app.get(&format!("/api/products/{}", id)).await.status(), 404);

    let products: Vec<serde_json::Value> =
        app.get("/api/products").await.json().await.unwrap();
    assert!(products.is_empty());

    app.cleanup().await;
}
