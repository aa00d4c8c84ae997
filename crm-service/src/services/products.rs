//! Product operations for crm-service.
//!
//! The update path here deliberately cannot touch `stock` or `price`; those
//! fields change only through the ledger and price-history paths in
//! `services::stock`, which pair every write with its audit row.

use crate::models::{
    CreateProduct, LowStockProduct, MinimumStockUpdate, PriceHistory, Product, UpdateProduct,
};
use crate::services::metrics::{BULK_UPDATES_TOTAL, DB_QUERY_DURATION};
use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use super::database::Database;

impl Database {
    /// Create a new product. The given stock is the opening balance; the
    /// ledger records changes from this point on.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        if input.stock < 0 || input.minimum_stock < 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Stock values must not be negative"
            )));
        }
        if input.price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Price must not be negative"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let product_id = Uuid::new_v4();
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                product_id, code, brand, description, stock, minimum_stock, price, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            "#,
        )
        .bind(product_id)
        .bind(&input.code)
        .bind(&input.brand)
        .bind(&input.description)
        .bind(input.stock)
        .bind(input.minimum_stock)
        .bind(input.price)
        .bind(input.expiry_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Product with code '{}' already exists",
                    input.code
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)),
        })?;

        timer.observe_duration();

        info!(product_id = %product.product_id, code = %product.code, "Product created");

        Ok(product)
    }

    /// Get an active product by ID.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            FROM products
            WHERE product_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(product_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// List active products, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            FROM products
            WHERE is_active = TRUE
            ORDER BY updated_utc DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Update an active product's descriptive fields. Stock and price are not
    /// reachable from here.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET code = COALESCE($2, code),
                brand = COALESCE($3, brand),
                description = COALESCE($4, description),
                minimum_stock = COALESCE($5, minimum_stock),
                expiry_date = $6,
                updated_utc = NOW()
            WHERE product_id = $1 AND is_active = TRUE
            RETURNING product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            "#,
        )
        .bind(product_id)
        .bind(&input.code)
        .bind(&input.brand)
        .bind(&input.description)
        .bind(input.minimum_stock)
        .bind(input.expiry_date)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Product code already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)),
        })?;

        timer.observe_duration();

        Ok(product)
    }

    /// Soft-delete a product. Returns false when no active row matched.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_product"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = FALSE, updated_utc = NOW()
            WHERE product_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(product_id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(product_id = %product_id, "Product deactivated");
        }

        Ok(deleted)
    }

    /// List active products at or below their minimum stock, with shortage.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self) -> Result<Vec<LowStockProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_low_stock"])
            .start_timer();

        let alerts = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT product_id, code, brand, description, stock, minimum_stock,
                minimum_stock - stock AS shortage
            FROM products
            WHERE is_active = TRUE AND stock <= minimum_stock
            ORDER BY minimum_stock - stock DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list low-stock products: {}", e))
        })?;

        timer.observe_duration();

        Ok(alerts)
    }

    /// List active products whose expiry date falls within the next
    /// `day_threshold` days.
    #[instrument(skip(self))]
    pub async fn list_expiring(&self, day_threshold: i64) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_expiring"])
            .start_timer();

        let today = chrono::Utc::now().date_naive();
        let threshold = today + chrono::Duration::days(day_threshold);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            FROM products
            WHERE is_active = TRUE
              AND expiry_date IS NOT NULL
              AND expiry_date >= $1
              AND expiry_date <= $2
            ORDER BY expiry_date
            "#,
        )
        .bind(today)
        .bind(threshold)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list expiring products: {}", e))
        })?;

        timer.observe_duration();

        Ok(products)
    }

    /// Set the minimum stock threshold for a product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_minimum_stock(
        &self,
        product_id: Uuid,
        minimum_stock: i32,
    ) -> Result<Option<Product>, AppError> {
        if minimum_stock < 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Minimum stock must not be negative"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_minimum_stock"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET minimum_stock = $2, updated_utc = NOW()
            WHERE product_id = $1 AND is_active = TRUE
            RETURNING product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            "#,
        )
        .bind(product_id)
        .bind(minimum_stock)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update minimum stock: {}", e))
        })?;

        timer.observe_duration();

        Ok(product)
    }

    /// Apply a batch of minimum-stock changes atomically. Any missing product
    /// aborts the whole batch.
    #[instrument(skip(self, updates), fields(item_count = updates.len()))]
    pub async fn update_minimum_stock_bulk(
        &self,
        updates: &[MinimumStockUpdate],
    ) -> Result<Vec<Product>, AppError> {
        for update in updates {
            if update.minimum_stock < 0 {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Minimum stock must not be negative: {}",
                    update.product_id
                )));
            }
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_minimum_stock_bulk"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let product = sqlx::query_as::<_, Product>(
                r#"
                UPDATE products
                SET minimum_stock = $2, updated_utc = NOW()
                WHERE product_id = $1 AND is_active = TRUE
                RETURNING product_id, code, brand, description, stock, minimum_stock, price,
                    expiry_date, is_active, created_utc, updated_utc
                "#,
            )
            .bind(update.product_id)
            .bind(update.minimum_stock)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update minimum stock: {}", e))
            })?;

            match product {
                Some(p) => results.push(p),
                None => {
                    BULK_UPDATES_TOTAL
                        .with_label_values(&["minimum_stock", "rolled_back"])
                        .inc();
                    return Err(AppError::NotFound(anyhow::anyhow!(
                        "Product not found: {}",
                        update.product_id
                    )));
                }
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        BULK_UPDATES_TOTAL
            .with_label_values(&["minimum_stock", "committed"])
            .inc();

        Ok(results)
    }

    /// List the price audit trail for a product, newest first.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_price_history(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<PriceHistory>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_price_history"])
            .start_timer();

        let history = sqlx::query_as::<_, PriceHistory>(
            r#"
            SELECT price_history_id, product_id, old_price, new_price, changed_by, notes,
                created_utc
            FROM price_history
            WHERE product_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list price history: {}", e))
        })?;

        timer.observe_duration();

        Ok(history)
    }
}
