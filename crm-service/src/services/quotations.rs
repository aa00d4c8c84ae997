//! Quotation operations for crm-service.
//!
//! The invariant maintained here is `total_amount == SUM(line_total)` over a
//! quotation's details. Every path that inserts, updates, or deletes a detail
//! finishes with `recompute_total_tx` on the same transaction, and line
//! totals come only from the pure `line_total` function in the models layer.

use crate::models::{
    line_total, CreateQuotation, CreateQuotationDetail, Product, Quotation, QuotationDetail,
    QuotationDetailWithProduct, QuotationWithCustomer, UpdateQuotation, UpdateQuotationDetail,
};
use crate::services::metrics::{DB_QUERY_DURATION, QUOTATION_OPERATIONS_TOTAL};
use crate::services::sequence::QUOTATION_NUMBER_PREFIX;
use chrono::Months;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::{Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use super::database::Database;

/// Reject out-of-range detail input before any write begins.
fn validate_detail_input(
    quantity: i32,
    unit_price: Option<Decimal>,
    discount: Option<Decimal>,
) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Quantity must be at least 1"
        )));
    }
    if let Some(price) = unit_price {
        if price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unit price must not be negative"
            )));
        }
    }
    if let Some(discount) = discount {
        if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Discount must be between 0 and 100"
            )));
        }
    }
    Ok(())
}

impl Database {
    /// Create a quotation with its details. The number is generated, the
    /// status starts at draft, and the total is computed once after all
    /// details are inserted — all in one transaction.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, detail_count = input.details.len()))]
    pub async fn create_quotation(&self, input: &CreateQuotation) -> Result<Quotation, AppError> {
        for detail in &input.details {
            validate_detail_input(detail.quantity, detail.unit_price, detail.discount)?;
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_quotation"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let customer_exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM customers WHERE customer_id = $1 AND is_active = TRUE")
                .bind(input.customer_id)
                .fetch_optional(&mut *tx)
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

        let today = chrono::Utc::now().date_naive();
        let quotation_number = self
            .next_code_tx(&mut tx, QUOTATION_NUMBER_PREFIX, today)
            .await?;
        let valid_until = input
            .valid_until
            .unwrap_or_else(|| today.checked_add_months(Months::new(1)).unwrap_or(today));

        let quotation_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO quotations (
                quotation_id, quotation_number, customer_id, status, total_amount,
                valid_until, notes
            )
            VALUES ($1, $2, $3, 'draft', 0, $4, $5)
            "#,
        )
        .bind(quotation_id)
        .bind(&quotation_number)
        .bind(input.customer_id)
        .bind(valid_until)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Quotation number '{}' already exists",
                    quotation_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create quotation: {}", e)),
        })?;

        for detail in &input.details {
            self.insert_detail_tx(&mut tx, quotation_id, detail).await?;
        }

        let quotation = self.recompute_total_tx(&mut tx, quotation_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        QUOTATION_OPERATIONS_TOTAL
            .with_label_values(&["create"])
            .inc();

        info!(
            quotation_id = %quotation.quotation_id,
            quotation_number = %quotation.quotation_number,
            total_amount = %quotation.total_amount,
            "Quotation created"
        );

        Ok(quotation)
    }

    /// Insert one detail row on the caller's transaction. Validates the
    /// referenced product and derives the line total; the caller recomputes
    /// the quotation total afterwards.
    async fn insert_detail_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        quotation_id: Uuid,
        input: &CreateQuotationDetail,
    ) -> Result<QuotationDetail, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            FROM products
            WHERE product_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(input.product_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check product: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Product not found: {}", input.product_id))
        })?;

        if product.price == Decimal::ZERO {
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "Product {} has no usable price",
                product.code
            )));
        }

        let unit_price = input.unit_price.unwrap_or(product.price);
        let discount = input.discount.unwrap_or(Decimal::ZERO);
        let total = line_total(input.quantity, unit_price, discount);

        let detail_id = Uuid::new_v4();
        let detail = sqlx::query_as::<_, QuotationDetail>(
            r#"
            INSERT INTO quotation_details (
                detail_id, quotation_id, product_id, quantity, unit_price, discount, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING detail_id, quotation_id, product_id, quantity, unit_price, discount,
                line_total, created_utc, updated_utc
            "#,
        )
        .bind(detail_id)
        .bind(quotation_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(unit_price)
        .bind(discount)
        .bind(total)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert detail: {}", e)))?;

        Ok(detail)
    }

    /// Rewrite `total_amount` from the surviving detail rows, on the caller's
    /// transaction. Every detail mutation ends with this call.
    pub(crate) async fn recompute_total_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        quotation_id: Uuid,
    ) -> Result<Quotation, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            UPDATE quotations
            SET total_amount = (
                    SELECT COALESCE(SUM(line_total), 0)
                    FROM quotation_details
                    WHERE quotation_id = $1
                ),
                updated_utc = NOW()
            WHERE quotation_id = $1
            RETURNING quotation_id, quotation_number, customer_id, status, total_amount,
                valid_until, notes, is_active, created_utc, updated_utc
            "#,
        )
        .bind(quotation_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to recompute total: {}", e))
        })?;

        Ok(quotation)
    }

    /// Get an active quotation by ID.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn get_quotation(&self, quotation_id: Uuid) -> Result<Option<Quotation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quotation"])
            .start_timer();

        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            SELECT quotation_id, quotation_number, customer_id, status, total_amount,
                valid_until, notes, is_active, created_utc, updated_utc
            FROM quotations
            WHERE quotation_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(quotation_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quotation: {}", e)))?;

        timer.observe_duration();

        Ok(quotation)
    }

    /// List a quotation's details joined with product display fields.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn get_quotation_details(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<QuotationDetailWithProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quotation_details"])
            .start_timer();

        let details = sqlx::query_as::<_, QuotationDetailWithProduct>(
            r#"
            SELECT d.detail_id, d.quotation_id, d.product_id, d.quantity, d.unit_price,
                d.discount, d.line_total, d.created_utc, d.updated_utc,
                p.code AS product_code, p.brand AS product_brand,
                p.description AS product_description
            FROM quotation_details d
            JOIN products p ON p.product_id = d.product_id
            WHERE d.quotation_id = $1
            ORDER BY d.created_utc
            "#,
        )
        .bind(quotation_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get details: {}", e)))?;

        timer.observe_duration();

        Ok(details)
    }

    /// List active quotations with customer display fields, newest first.
    #[instrument(skip(self))]
    pub async fn list_quotations(&self) -> Result<Vec<QuotationWithCustomer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_quotations"])
            .start_timer();

        let quotations = sqlx::query_as::<_, QuotationWithCustomer>(
            r#"
            SELECT q.quotation_id, q.quotation_number, q.customer_id, q.status,
                q.total_amount, q.valid_until, q.notes, q.is_active, q.created_utc,
                q.updated_utc, c.customer_code, c.company_name AS customer_name
            FROM quotations q
            JOIN customers c ON c.customer_id = q.customer_id
            WHERE q.is_active = TRUE
            ORDER BY q.created_utc DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list quotations: {}", e))
        })?;

        timer.observe_duration();

        Ok(quotations)
    }

    /// Update a quotation. When details are supplied the existing rows are
    /// deleted and replaced wholesale; the total is recomputed either way,
    /// all in one transaction.
    #[instrument(skip(self, input), fields(quotation_id = %quotation_id))]
    pub async fn update_quotation(
        &self,
        quotation_id: Uuid,
        input: &UpdateQuotation,
    ) -> Result<Option<Quotation>, AppError> {
        if let Some(details) = &input.details {
            for detail in details {
                validate_detail_input(detail.quantity, detail.unit_price, detail.discount)?;
            }
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_quotation"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = self.lock_quotation_tx(&mut tx, quotation_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE quotations
            SET status = COALESCE($2, status),
                valid_until = COALESCE($3, valid_until),
                notes = COALESCE($4, notes),
                updated_utc = NOW()
            WHERE quotation_id = $1
            "#,
        )
        .bind(quotation_id)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.valid_until)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update quotation: {}", e)))?;

        if let Some(details) = &input.details {
            sqlx::query("DELETE FROM quotation_details WHERE quotation_id = $1")
                .bind(quotation_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to replace details: {}", e))
                })?;

            for detail in details {
                self.insert_detail_tx(&mut tx, quotation_id, detail).await?;
            }
        }

        let quotation = self.recompute_total_tx(&mut tx, quotation_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        QUOTATION_OPERATIONS_TOTAL
            .with_label_values(&["update"])
            .inc();

        Ok(Some(quotation))
    }

    /// Soft-delete a quotation. Returns false when no active row matched.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn delete_quotation(&self, quotation_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_quotation"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE quotations
            SET is_active = FALSE, updated_utc = NOW()
            WHERE quotation_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(quotation_id)
        .execute(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete quotation: {}", e))
        })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            QUOTATION_OPERATIONS_TOTAL
                .with_label_values(&["delete"])
                .inc();
            info!(quotation_id = %quotation_id, "Quotation deactivated");
        }

        Ok(deleted)
    }

    /// Add a detail to a quotation and recompute its total.
    #[instrument(skip(self, input), fields(quotation_id = %quotation_id))]
    pub async fn add_quotation_detail(
        &self,
        quotation_id: Uuid,
        input: &CreateQuotationDetail,
    ) -> Result<(QuotationDetail, Quotation), AppError> {
        validate_detail_input(input.quantity, input.unit_price, input.discount)?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_quotation_detail"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if self.lock_quotation_tx(&mut tx, quotation_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Quotation not found: {}",
                quotation_id
            )));
        }

        let detail = self.insert_detail_tx(&mut tx, quotation_id, input).await?;
        let quotation = self.recompute_total_tx(&mut tx, quotation_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        QUOTATION_OPERATIONS_TOTAL
            .with_label_values(&["add_detail"])
            .inc();

        Ok((detail, quotation))
    }

    /// Update a detail, recompute its line total from the merged fields, and
    /// recompute the parent quotation's total.
    #[instrument(skip(self, input), fields(detail_id = %detail_id))]
    pub async fn update_quotation_detail(
        &self,
        detail_id: Uuid,
        input: &UpdateQuotationDetail,
    ) -> Result<(QuotationDetail, Quotation), AppError> {
        validate_detail_input(input.quantity.unwrap_or(1), input.unit_price, input.discount)?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_quotation_detail"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, QuotationDetail>(
            r#"
            SELECT detail_id, quotation_id, product_id, quantity, unit_price, discount,
                line_total, created_utc, updated_utc
            FROM quotation_details
            WHERE detail_id = $1
            FOR UPDATE
            "#,
        )
        .bind(detail_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock detail: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quotation detail not found: {}", detail_id))
        })?;

        if self
            .lock_quotation_tx(&mut tx, existing.quotation_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Quotation not found: {}",
                existing.quotation_id
            )));
        }

        let quantity = input.quantity.unwrap_or(existing.quantity);
        let unit_price = input.unit_price.unwrap_or(existing.unit_price);
        let discount = input.discount.unwrap_or(existing.discount);
        let total = line_total(quantity, unit_price, discount);

        let detail = sqlx::query_as::<_, QuotationDetail>(
            r#"
            UPDATE quotation_details
            SET quantity = $2,
                unit_price = $3,
                discount = $4,
                line_total = $5,
                updated_utc = NOW()
            WHERE detail_id = $1
            RETURNING detail_id, quotation_id, product_id, quantity, unit_price, discount,
                line_total, created_utc, updated_utc
            "#,
        )
        .bind(detail_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(discount)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update detail: {}", e)))?;

        let quotation = self
            .recompute_total_tx(&mut tx, existing.quotation_id)
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        QUOTATION_OPERATIONS_TOTAL
            .with_label_values(&["update_detail"])
            .inc();

        Ok((detail, quotation))
    }

    /// Delete a detail and recompute the parent quotation's total.
    #[instrument(skip(self), fields(detail_id = %detail_id))]
    pub async fn delete_quotation_detail(&self, detail_id: Uuid) -> Result<Quotation, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_quotation_detail"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let quotation_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT quotation_id FROM quotation_details WHERE detail_id = $1 FOR UPDATE",
        )
        .bind(detail_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock detail: {}", e)))?;

        let quotation_id = quotation_id.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quotation detail not found: {}", detail_id))
        })?;

        if self.lock_quotation_tx(&mut tx, quotation_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Quotation not found: {}",
                quotation_id
            )));
        }

        sqlx::query("DELETE FROM quotation_details WHERE detail_id = $1")
            .bind(detail_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete detail: {}", e))
            })?;

        let quotation = self.recompute_total_tx(&mut tx, quotation_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        QUOTATION_OPERATIONS_TOTAL
            .with_label_values(&["delete_detail"])
            .inc();

        Ok(quotation)
    }

    /// Lock an active quotation row to serialize concurrent detail mutations
    /// and total recomputation. Returns None when no active row exists.
    async fn lock_quotation_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        quotation_id: Uuid,
    ) -> Result<Option<Quotation>, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            SELECT quotation_id, quotation_number, customer_id, status, total_amount,
                valid_until, notes, is_active, created_utc, updated_utc
            FROM quotations
            WHERE quotation_id = $1 AND is_active = TRUE
            FOR UPDATE
            "#,
        )
        .bind(quotation_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock quotation: {}", e)))?;

        Ok(quotation)
    }
}
