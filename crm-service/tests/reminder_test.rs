//! Reminder integration tests for crm-service.

mod common;

use common::TestApp;
use serde_json::json;

async fn seed_customer(app: &TestApp) -> String {
    let customer = app
        .create_customer("Reminder Co", "reminders@example.com")
        .await;
    customer["customer_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_and_complete_reminder() {
    let app = TestApp::spawn().await;
    let customer_id = seed_customer(&app).await;

    let due = chrono::Utc::now().date_naive() + chrono::Duration::days(7);
    let response = app
        .post_json(
            "/api/reminders",
            &json!({
                "customer_id": customer_id,
                "title": "Follow up on offer",
                "description": "Call after the demo",
                "due_date": due.to_string(),
                "priority": "high"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let reminder: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reminder["status"], "pending");
    assert_eq!(reminder["priority"], "high");
    let id = reminder["reminder_id"].as_str().unwrap();

    let response = app
        .put_json(
            &format!("/api/reminders/{}", id),
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "completed");

    app.cleanup().await;
}

#[tokio::test]
async fn reminder_for_unknown_customer_is_not_found() {
    let app = TestApp::spawn().await;

    let due = chrono::Utc::now().date_naive();
    let response = app
        .post_json(
            "/api/reminders",
            &json!({
                "customer_id": uuid::Uuid::new_v4(),
                "title": "Orphan",
                "description": "No customer",
                "due_date": due.to_string()
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn reminder_product_reference_is_validated() {
    let app = TestApp::spawn().await;
    let customer_id = seed_customer(&app).await;

    let due = chrono::Utc::now().date_naive();
    let response = app
        .post_json(
            "/api/reminders",
            &json!({
                "customer_id": customer_id,
                "product_id": uuid::Uuid::new_v4(),
                "title": "Expiry check",
                "description": "References a product that does not exist",
                "due_date": due.to_string()
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn list_filters_by_status_and_due_window() {
    let app = TestApp::spawn().await;
    let customer_id = seed_customer(&app).await;

    let today = chrono::Utc::now().date_naive();
    for (title, days, complete) in [("Soon", 1, false), ("Later", 30, false), ("Done", 2, true)] {
        let due = today + chrono::Duration::days(days);
        let response = app
            .post_json(
                "/api/reminders",
                &json!({
                    "customer_id": customer_id,
                    "title": title,
                    "description": "window test",
                    "due_date": due.to_string()
                }),
            )
            .await;
        assert_eq!(response.status(), 201);

        if complete {
            let reminder: serde_json::Value = response.json().await.unwrap();
            let id = reminder["reminder_id"].as_str().unwrap();
            app.put_json(
                &format!("/api/reminders/{}", id),
                &json!({ "status": "completed" }),
            )
            .await;
        }
    }

    let pending: Vec<serde_json::Value> = app
        .get("/api/reminders?status=pending")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);

    let due_soon: Vec<serde_json::Value> = app
        .get(&format!(
            "/api/reminders?status=pending&due_before={}",
            today + chrono::Duration::days(7)
        ))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(due_soon.len(), 1);
    assert_eq!(due_soon[0]["title"], "Soon");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_is_soft_and_hides_reminder() {
    let app = TestApp::spawn().await;
    let customer_id = seed_customer(&app).await;

    let due = chrono::Utc::now().date_naive();
    let response = app
        .post_json(
            "/api/reminders",
            &json!({
                "customer_id": customer_id,
                "title": "Short lived",
                "description": "Deleted in test",
                "due_date": due.to_string()
            }),
        )
        .await;
    let reminder: serde_json::Value = response.json().await.unwrap();
    let id = reminder["reminder_id"].as_str().unwrap();

    assert_eq!(app.delete(&format!("/api/reminders/{}", id)).await.status(), 204);
    assert_eq!(app.get(&format!("/api/reminders/{}", id)).await.status(), 404);

    let reminders: Vec<serde_json::Value> =
        app.get("/api/reminders").await.json().await.unwrap();
    assert!(reminders.is_empty());

    app.cleanup().await;
}
