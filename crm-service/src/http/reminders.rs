//! Reminder endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateReminder, ListRemindersFilter, ReminderPriority, ReminderStatus, UpdateReminder,
};
use crate::startup::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reminders", get(list_reminders).post(create_reminder))
        .route(
            "/reminders/:id",
            get(get_reminder)
                .put(update_reminder)
                .delete(delete_reminder),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReminderRequest {
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 1024))]
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Option<ReminderPriority>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateReminderRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<ReminderStatus>,
    pub priority: Option<ReminderPriority>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RemindersQuery {
    pub status: Option<ReminderStatus>,
    pub customer_id: Option<Uuid>,
    pub due_before: Option<NaiveDate>,
}

async fn list_reminders(
    State(state): State<AppState>,
    Query(query): Query<RemindersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ListRemindersFilter {
        status: query.status,
        customer_id: query.customer_id,
        due_before: query.due_before,
    };
    let reminders = state.db.list_reminders(&filter).await?;
    Ok(Json(reminders))
}

async fn create_reminder(
    State(state): State<AppState>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let input = CreateReminder {
        customer_id: request.customer_id,
        product_id: request.product_id,
        title: request.title,
        description: request.description,
        due_date: request.due_date,
        priority: request.priority,
    };
    let reminder = state.db.create_reminder(&input).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn get_reminder(
    State(state): State<AppState>,
    Path(reminder_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reminder = state
        .db
        .get_reminder(reminder_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reminder not found: {}", reminder_id)))?;
    Ok(Json(reminder))
}

async fn update_reminder(
    State(state): State<AppState>,
    Path(reminder_id): Path<Uuid>,
    Json(request): Json<UpdateReminderRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let input = UpdateReminder {
        title: request.title,
        description: request.description,
        due_date: request.due_date,
        status: request.status,
        priority: request.priority,
    };
    let reminder = state
        .db
        .update_reminder(reminder_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reminder not found: {}", reminder_id)))?;
    Ok(Json(reminder))
}

async fn delete_reminder(
    State(state): State<AppState>,
    Path(reminder_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_reminder(reminder_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Reminder not found: {}",
            reminder_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
