//! Bulk update engine integration tests for crm-service.

mod common;

use common::{decimal_field, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn bulk_stock_update_applies_all_items_with_ledger_entries() {
    let app = TestApp::spawn().await;

    let first = app.create_product("BULK-1", 10, "10.00").await;
    let second = app.create_product("BULK-2", 30, "10.00").await;
    let first_id = first["product_id"].as_str().unwrap();
    let second_id = second["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/stock/bulk",
            &json!({
                "updates": [
                    { "product_id": first_id, "new_stock": 25, "description": "stocktake" },
                    { "product_id": second_id, "new_stock": 12, "description": "stocktake" }
                ],
                "created_by": "warehouse"
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let products: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(products.len(), 2);
    // Results come back in input order
    assert_eq!(products[0]["stock"], 25);
    assert_eq!(products[1]["stock"], 12);

    // One ledger entry each, direction derived from the delta
    let movements: Vec<serde_json::Value> = app
        .get(&format!("/api/stock/movements?product_id={}", first_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["movement_type"], "in");
    assert_eq!(movements[0]["quantity"], 15);
    assert_eq!(movements[0]["created_by"], "warehouse");

    let movements: Vec<serde_json::Value> = app
        .get(&format!("/api/stock/movements?product_id={}", second_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["movement_type"], "out");
    assert_eq!(movements[0]["quantity"], 18);

    app.cleanup().await;
}

#[tokio::test]
async fn bulk_stock_zero_delta_writes_no_ledger_entry() {
    let app = TestApp::spawn().await;

    let product = app.create_product("ZERO-1", 7, "10.00").await;
    let id = product["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/stock/bulk",
            &json!({
                "updates": [
                    { "product_id": id, "new_stock": 7, "description": "no-op stocktake" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let products: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["stock"], 7);

    let movements: Vec<serde_json::Value> = app
        .get(&format!("/api/stock/movements?product_id={}", id))
        .await
        .json()
        .await
        .unwrap();
    assert!(movements.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn bulk_stock_update_rolls_back_on_missing_product() {
    let app = TestApp::spawn().await;

    let product = app.create_product("ATOMIC-1", 10, "10.00").await;
    let id = product["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/stock/bulk",
            &json!({
                "updates": [
                    { "product_id": id, "new_stock": 99, "description": "will roll back" },
                    { "product_id": uuid::Uuid::new_v4(), "new_stock": 5, "description": "missing" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    // The first item was fully rolled back: stock unchanged, no ledger entry
    let fetched: serde_json::Value = app
        .get(&format!("/api/products/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["stock"], 10);

    let movements: Vec<serde_json::Value> = app
        .get(&format!("/api/stock/movements?product_id={}", id))
        .await
        .json()
        .await
        .unwrap();
    assert!(movements.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn bulk_price_update_pairs_each_change_with_history() {
    let app = TestApp::spawn().await;

    let first = app.create_product("PRICE-1", 5, "100.00").await;
    let second = app.create_product("PRICE-2", 5, "250.00").await;
    let first_id = first["product_id"].as_str().unwrap();
    let second_id = second["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/price/bulk",
            &json!({
                "updates": [
                    { "product_id": first_id, "new_price": "110.00", "reason": "supplier increase", "changed_by": "purchasing" },
                    { "product_id": second_id, "new_price": "240.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let products: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(decimal_field(&products[0], "price"), Decimal::new(11000, 2));
    assert_eq!(decimal_field(&products[1], "price"), Decimal::new(24000, 2));

    let history: Vec<serde_json::Value> = app
        .get(&format!("/api/products/{}/price-history", first_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(decimal_field(&history[0], "old_price"), Decimal::new(10000, 2));
    assert_eq!(decimal_field(&history[0], "new_price"), Decimal::new(11000, 2));
    assert_eq!(history[0]["changed_by"], "purchasing");
    assert_eq!(history[0]["notes"], "supplier increase");

    app.cleanup().await;
}

#[tokio::test]
async fn bulk_price_update_rolls_back_on_missing_product() {
    let app = TestApp::spawn().await;

    let product = app.create_product("PATOMIC-1", 5, "100.00").await;
    let id = product["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/price/bulk",
            &json!({
                "updates": [
                    { "product_id": id, "new_price": "175.00" },
                    { "product_id": uuid::Uuid::new_v4(), "new_price": "5.00" }
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
    assert_eq!(decimal_field(&fetched, "price"), Decimal::new(10000, 2));

    let history: Vec<serde_json::Value> = app
        .get(&format!("/api/products/{}/price-history", id))
        .await
        .json()
        .await
        .unwrap();
    assert!(history.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn bulk_stock_rejects_negative_target_before_any_write() {
    let app = TestApp::spawn().await;

    let product = app.create_product("NEG-1", 10, "10.00").await;
    let id = product["product_id"].as_str().unwrap();

    let response = app
        .put_json(
            "/api/stock/bulk",
            &json!({
                "updates": [
                    { "product_id": id, "new_stock": -1, "description": "invalid" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let fetched: serde_json::Value = app
        .get(&format!("/api/products/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["stock"], 10);

    app.cleanup().await;
}
