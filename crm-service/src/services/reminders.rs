//! Reminder operations for crm-service.

use crate::models::{CreateReminder, ListRemindersFilter, Reminder, UpdateReminder};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use super::database::Database;

impl Database {
    /// Create a reminder. The customer (and product, when referenced) must
    /// exist and be active.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_reminder(&self, input: &CreateReminder) -> Result<Reminder, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_reminder"])
            .start_timer();

        let customer_exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM customers WHERE customer_id = $1 AND is_active = TRUE")
                .bind(input.customer_id)
                .fetch_optional(self.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to check customer: {}", e))
                })?;
        if customer_exists.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer not found: {}",
                input.customer_id
            )));
        }

        if let Some(product_id) = input.product_id {
            let product_exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM products WHERE product_id = $1 AND is_active = TRUE")
                    .bind(product_id)
                    .fetch_optional(self.pool())
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to check product: {}", e))
                    })?;
            if product_exists.is_none() {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Product not found: {}",
                    product_id
                )));
            }
        }

        let priority = input
            .priority
            .map(|p| p.as_str())
            .unwrap_or("medium");

        let reminder_id = Uuid::new_v4();
        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (
                reminder_id, customer_id, product_id, title, description, due_date,
                status, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING reminder_id, customer_id, product_id, title, description, due_date,
                status, priority, is_active, created_utc, updated_utc
            "#,
        )
        .bind(reminder_id)
        .bind(input.customer_id)
        .bind(input.product_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.due_date)
        .bind(priority)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create reminder: {}", e)))?;

        timer.observe_duration();

        info!(reminder_id = %reminder.reminder_id, "Reminder created");

        Ok(reminder)
    }

    /// Get an active reminder by ID.
    #[instrument(skip(self), fields(reminder_id = %reminder_id))]
    pub async fn get_reminder(&self, reminder_id: Uuid) -> Result<Option<Reminder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_reminder"])
            .start_timer();

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT reminder_id, customer_id, product_id, title, description, due_date,
                status, priority, is_active, created_utc, updated_utc
            FROM reminders
            WHERE reminder_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(reminder_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get reminder: {}", e)))?;

        timer.observe_duration();

        Ok(reminder)
    }

    /// List active reminders ordered by due date, with optional status,
    /// customer, and due-window filters.
    #[instrument(skip(self, filter))]
    pub async fn list_reminders(
        &self,
        filter: &ListRemindersFilter,
    ) -> Result<Vec<Reminder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_reminders"])
            .start_timer();

        let status = filter.status.map(|s| s.as_str());

        let reminders = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT reminder_id, customer_id, product_id, title, description, due_date,
                status, priority, is_active, created_utc, updated_utc
            FROM reminders
            WHERE is_active = TRUE
              AND ($1::varchar IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::date IS NULL OR due_date <= $3)
            ORDER BY due_date
            "#,
        )
        .bind(status)
        .bind(filter.customer_id)
        .bind(filter.due_before)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list reminders: {}", e)))?;

        timer.observe_duration();

        Ok(reminders)
    }

    /// Update an active reminder.
    #[instrument(skip(self, input), fields(reminder_id = %reminder_id))]
    pub async fn update_reminder(
        &self,
        reminder_id: Uuid,
        input: &UpdateReminder,
    ) -> Result<Option<Reminder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_reminder"])
            .start_timer();

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            UPDATE reminders
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                due_date = COALESCE($4, due_date),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                updated_utc = NOW()
            WHERE reminder_id = $1 AND is_active = TRUE
            RETURNING reminder_id, customer_id, product_id, title, description, due_date,
                status, priority, is_active, created_utc, updated_utc
            "#,
        )
        .bind(reminder_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.due_date)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.priority.map(|p| p.as_str()))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update reminder: {}", e)))?;

        timer.observe_duration();

        Ok(reminder)
    }

    /// Soft-delete a reminder. Returns false when no active row matched.
    #[instrument(skip(self), fields(reminder_id = %reminder_id))]
    pub async fn delete_reminder(&self, reminder_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_reminder"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE reminders
            SET is_active = FALSE, updated_utc = NOW()
            WHERE reminder_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(reminder_id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete reminder: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(reminder_id = %reminder_id, "Reminder deactivated");
        }

        Ok(deleted)
    }
}
