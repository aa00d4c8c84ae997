//! Customer operations for crm-service.

use crate::models::{CreateCustomer, Customer, UpdateCustomer};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::sequence::CUSTOMER_CODE_PREFIX;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use super::database::Database;

impl Database {
    /// Create a new customer with a generated customer code.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let today = chrono::Utc::now().date_naive();
        let customer_code = self
            .next_code_tx(&mut tx, CUSTOMER_CODE_PREFIX, today)
            .await?;

        let customer_id = Uuid::new_v4();
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                customer_id, customer_code, company_name, email, phone, address,
                tax_office, tax_number, contact_person, contact_phone, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING customer_id, customer_code, company_name, email, phone, address,
                tax_office, tax_number, contact_person, contact_phone, notes,
                is_active, created_utc, updated_utc
            "#,
        )
        .bind(customer_id)
        .bind(&customer_code)
        .bind(&input.company_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.tax_office)
        .bind(&input.tax_number)
        .bind(&input.contact_person)
        .bind(&input.contact_phone)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Customer with email '{}' or code '{}' already exists",
                    input.email,
                    customer_code
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)),
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            customer_id = %customer.customer_id,
            customer_code = %customer.customer_code,
            "Customer created"
        );

        Ok(customer)
    }

    /// Get an active customer by ID.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, customer_code, company_name, email, phone, address,
                tax_office, tax_number, contact_person, contact_phone, notes,
                is_active, created_utc, updated_utc
            FROM customers
            WHERE customer_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(customer_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Get an active customer by its generated code.
    #[instrument(skip(self), fields(customer_code = %customer_code))]
    pub async fn get_customer_by_code(
        &self,
        customer_code: &str,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer_by_code"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, customer_code, company_name, email, phone, address,
                tax_office, tax_number, contact_person, contact_phone, notes,
                is_active, created_utc, updated_utc
            FROM customers
            WHERE customer_code = $1 AND is_active = TRUE
            "#,
        )
        .bind(customer_code)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List active customers, most recently created first.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, customer_code, company_name, email, phone, address,
                tax_office, tax_number, contact_person, contact_phone, notes,
                is_active, created_utc, updated_utc
            FROM customers
            WHERE is_active = TRUE
            ORDER BY created_utc DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Update an active customer. The customer code is immutable.
    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET company_name = COALESCE($2, company_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                tax_office = COALESCE($6, tax_office),
                tax_number = COALESCE($7, tax_number),
                contact_person = COALESCE($8, contact_person),
                contact_phone = COALESCE($9, contact_phone),
                notes = COALESCE($10, notes),
                updated_utc = NOW()
            WHERE customer_id = $1 AND is_active = TRUE
            RETURNING customer_id, customer_code, company_name, email, phone, address,
                tax_office, tax_number, contact_person, contact_phone, notes,
                is_active, created_utc, updated_utc
            "#,
        )
        .bind(customer_id)
        .bind(&input.company_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.tax_office)
        .bind(&input.tax_number)
        .bind(&input.contact_person)
        .bind(&input.contact_phone)
        .bind(&input.notes)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Customer email already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)),
        })?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Soft-delete a customer. Returns false when no active row matched.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET is_active = FALSE, updated_utc = NOW()
            WHERE customer_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(customer_id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(customer_id = %customer_id, "Customer deactivated");
        }

        Ok(deleted)
    }
}
