//! Quotation integration tests for crm-service.

mod common;

use chrono::Datelike;
use common::{decimal_field, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

/// Create a customer and two priced products; returns (customer_id,
/// product_a_id, product_b_id). Product A costs 100.00, product B 50.00.
async fn seed(app: &TestApp) -> (String, String, String) {
    let customer = app.create_customer("Quote Co", "quotes@example.com").await;
    let product_a = app.create_product("QP-A", 100, "100.00").await;
    let product_b = app.create_product("QP-B", 100, "50.00").await;
    (
        customer["customer_id"].as_str().unwrap().to_string(),
        product_a["product_id"].as_str().unwrap().to_string(),
        product_b["product_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn create_quotation_computes_line_and_grand_totals() {
    let app = TestApp::spawn().await;
    let (customer_id, product_a, product_b) = seed(&app).await;

    let response = app
        .post_json(
            "/api/quotations",
            &json!({
                "customer_id": customer_id,
                "details": [
                    { "product_id": product_a, "quantity": 3, "unit_price": "100.00", "discount": "10" },
                    { "product_id": product_b, "quantity": 2 }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let quotation: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quotation["status"], "draft");

    let details = quotation["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    // 3 * 100.00 at 10% off
    assert_eq!(decimal_field(&details[0], "line_total"), Decimal::new(27000, 2));
    // unit price defaulted from the product
    assert_eq!(decimal_field(&details[1], "unit_price"), Decimal::new(5000, 2));
    assert_eq!(decimal_field(&details[1], "line_total"), Decimal::new(10000, 2));

    // Grand total is the sum of line totals
    assert_eq!(decimal_field(&quotation, "total_amount"), Decimal::new(37000, 2));

    let now = chrono::Utc::now().date_naive();
    let expected_prefix = format!("QUO-{:04}{:02}", now.year(), now.month());
    assert!(quotation["quotation_number"]
        .as_str()
        .unwrap()
        .starts_with(&expected_prefix));

    app.cleanup().await;
}

#[tokio::test]
async fn quotation_numbers_increase_in_creation_order() {
    let app = TestApp::spawn().await;
    let (customer_id, _, _) = seed(&app).await;

    let mut numbers = Vec::new();
    for _ in 0..2 {
        let response = app
            .post_json("/api/quotations", &json!({ "customer_id": customer_id }))
            .await;
        assert_eq!(response.status(), 201);
        let quotation: serde_json::Value = response.json().await.unwrap();
        numbers.push(quotation["quotation_number"].as_str().unwrap().to_string());
    }

    assert!(numbers[1] > numbers[0]);

    app.cleanup().await;
}

#[tokio::test]
async fn create_for_unknown_customer_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/quotations",
            &json!({ "customer_id": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn create_with_unpriced_product_rolls_back_everything() {
    let app = TestApp::spawn().await;
    let (customer_id, product_a, _) = seed(&app).await;
    let unpriced = app.create_product("FREE-1", 10, "0").await;

    let response = app
        .post_json(
            "/api/quotations",
            &json!({
                "customer_id": customer_id,
                "details": [
                    { "product_id": product_a, "quantity": 1 },
                    { "product_id": unpriced["product_id"], "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 409);

    // Neither the quotation nor the first detail survived
    let quotations: Vec<serde_json::Value> =
        app.get("/api/quotations").await.json().await.unwrap();
    assert!(quotations.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn detail_mutations_recompute_total_every_time() {
    let app = TestApp::spawn().await;
    let (customer_id, product_a, product_b) = seed(&app).await;

    let response = app
        .post_json(
            "/api/quotations",
            &json!({
                "customer_id": customer_id,
                "details": [
                    { "product_id": product_a, "quantity": 1, "unit_price": "100.00" }
                ]
            }),
        )
        .await;
    let quotation: serde_json::Value = response.json().await.unwrap();
    let quotation_id = quotation["quotation_id"].as_str().unwrap();
    assert_eq!(decimal_field(&quotation, "total_amount"), Decimal::new(10000, 2));

    // Add: 100 + 2*50 = 200
    let response = app
        .post_json(
            &format!("/api/quotations/{}/details", quotation_id),
            &json!({ "product_id": product_b, "quantity": 2 }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let detail_id = body["detail"]["detail_id"].as_str().unwrap().to_string();
    assert_eq!(decimal_field(&body["quotation"], "total_amount"), Decimal::new(20000, 2));

    // Re-query, not just trust the mutation response
    let fetched: serde_json::Value = app
        .get(&format!("/api/quotations/{}", quotation_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(decimal_field(&fetched, "total_amount"), Decimal::new(20000, 2));

    // Update: second line becomes 4*50 at 50% = 100 -> total 200 -> 100+100
    let response = app
        .put_json(
            &format!("/api/quotations/details/{}", detail_id),
            &json!({ "quantity": 4, "discount": "50" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(decimal_field(&body["detail"], "line_total"), Decimal::new(10000, 2));
    assert_eq!(decimal_field(&body["quotation"], "total_amount"), Decimal::new(20000, 2));

    let fetched: serde_json::Value = app
        .get(&format!("/api/quotations/{}", quotation_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(decimal_field(&fetched, "total_amount"), Decimal::new(20000, 2));

    // Delete: only the first line remains
    let response = app
        .delete(&format!("/api/quotations/details/{}", detail_id))
        .await;
    assert_eq!(response.status(), 200);
    let quotation: serde_json::Value = response.json().await.unwrap();
    assert_eq!(decimal_field(&quotation, "total_amount"), Decimal::new(10000, 2));

    let fetched: serde_json::Value = app
        .get(&format!("/api/quotations/{}", quotation_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(decimal_field(&fetched, "total_amount"), Decimal::new(10000, 2));
    assert_eq!(fetched["details"].as_array().unwrap().len(), 1);

    app.cleanup().await;
}

#[tokio::test]
async fn update_with_details_replaces_them_wholesale() {
    let app = TestApp::spawn().await;
    let (customer_id, product_a, product_b) = seed(&app).await;

    let response = app
        .post_json(
            "/api/quotations",
            &json!({
                "customer_id": customer_id,
                "details": [
                    { "product_id": product_a, "quantity": 2, "unit_price": "100.00" },
                    { "product_id": product_a, "quantity": 1, "unit_price": "100.00" }
                ]
            }),
        )
        .await;
    let quotation: serde_json::Value = response.json().await.unwrap();
    let quotation_id = quotation["quotation_id"].as_str().unwrap();
    assert_eq!(decimal_field(&quotation, "total_amount"), Decimal::new(30000, 2));

    let response = app
        .put_json(
            &format!("/api/quotations/{}", quotation_id),
            &json!({
                "status": "sent",
                "details": [
                    { "product_id": product_b, "quantity": 1, "unit_price": "50.00" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "sent");
    let details = updated["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["product_id"].as_str().unwrap(), product_b);
    assert_eq!(decimal_field(&updated, "total_amount"), Decimal::new(5000, 2));

    app.cleanup().await;
}

#[tokio::test]
async fn status_transitions_are_not_policed_by_the_core() {
    let app = TestApp::spawn().await;
    let (customer_id, _, _) = seed(&app).await;

    let response = app
        .post_json("/api/quotations", &json!({ "customer_id": customer_id }))
        .await;
    let quotation: serde_json::Value = response.json().await.unwrap();
    let quotation_id = quotation["quotation_id"].as_str().unwrap();

    for status in ["sent", "accepted", "draft"] {
        let response = app
            .put_json(
                &format!("/api/quotations/{}", quotation_id),
                &json!({ "status": status }),
            )
            .await;
        assert_eq!(response.status(), 200);
        let updated: serde_json::Value = response.json().await.unwrap();
        assert_eq!(updated["status"], status);
    }

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_discount_is_rejected_before_any_write() {
    let app = TestApp::spawn().await;
    let (customer_id, product_a, _) = seed(&app).await;

    let response = app
        .post_json(
            "/api/quotations",
            &json!({
                "customer_id": customer_id,
                "details": [
                    { "product_id": product_a, "quantity": 1, "discount": "150" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 422);

    let quotations: Vec<serde_json::Value> =
        app.get("/api/quotations").await.json().await.unwrap();
    assert!(quotations.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn delete_is_soft_and_hides_quotation() {
    let app = TestApp::spawn().await;
    let (customer_id, _, _) = seed(&app).await;

    let response = app
        .post_json("/api/quotations", &json!({ "customer_id": customer_id }))
        .await;
    let quotation: serde_json::Value = response.json().await.unwrap();
    let quotation_id = quotation["quotation_id"].as_str().unwrap();

    assert_eq!(
        app.delete(&format!("/api/quotations/{}", quotation_id))
            .await
            .status(),
        204
    );
    assert_eq!(
        app.get(&format!("/api/quotations/{}", quotation_id))
            .await
            .status(),
        404
    );

    app.cleanup().await;
}
