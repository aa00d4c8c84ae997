//! Reminder model for crm-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reminder status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Completed => "completed",
            ReminderStatus::Cancelled => "cancelled",
        }
    }
}

/// Reminder priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPriority {
    Low,
    Medium,
    High,
}

impl ReminderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderPriority::Low => "low",
            ReminderPriority::Medium => "medium",
            ReminderPriority::High => "high",
        }
    }
}

/// Reminder record. Follows the same soft-delete discipline as customers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub reminder_id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: String,
    pub priority: String,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a reminder.
#[derive(Debug, Clone)]
pub struct CreateReminder {
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Option<ReminderPriority>,
}

/// Input for updating a reminder.
#[derive(Debug, Clone, Default)]
pub struct UpdateReminder {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<ReminderStatus>,
    pub priority: Option<ReminderPriority>,
}

/// Filter parameters for listing reminders.
#[derive(Debug, Clone, Default)]
pub struct ListRemindersFilter {
    pub status: Option<ReminderStatus>,
    pub customer_id: Option<Uuid>,
    pub due_before: Option<NaiveDate>,
}
