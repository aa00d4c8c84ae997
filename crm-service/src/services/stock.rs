//! Stock ledger and bulk update engine for crm-service.
//!
//! Every change to `products.stock` goes through `apply_movement_tx`, which
//! locks the product row, rejects movements that would drive stock negative,
//! and writes the ledger entry in the same transaction as the stock update.
//! The bulk operations reuse the same helper on a batch-wide transaction so a
//! failing item rolls back every earlier item.

use crate::models::{
    CreateStockMovement, MovementFilter, MovementType, PriceUpdate, Product, StockMovement,
    StockMovementWithProduct, StockUpdate,
};
use crate::services::metrics::{BULK_UPDATES_TOTAL, DB_QUERY_DURATION, STOCK_MOVEMENTS_TOTAL};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::{Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use super::database::Database;

impl Database {
    /// Apply a single stock movement and return the ledger entry together
    /// with the updated product.
    #[instrument(skip(self, input), fields(product_id = %input.product_id, movement_type = input.movement_type.as_str()))]
    pub async fn create_stock_movement(
        &self,
        input: &CreateStockMovement,
    ) -> Result<(StockMovement, Product), AppError> {
        if input.quantity <= 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Movement quantity must be a positive integer"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_stock_movement"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let (movement, product) = self.apply_movement_tx(&mut tx, input).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        STOCK_MOVEMENTS_TOTAL
            .with_label_values(&[input.movement_type.as_str()])
            .inc();

        info!(
            movement_id = %movement.movement_id,
            product_id = %product.product_id,
            previous_stock = movement.previous_stock,
            new_stock = movement.new_stock,
            "Stock movement applied"
        );

        Ok((movement, product))
    }

    /// The sole writer of `products.stock`: locks the product row, validates
    /// the movement, updates the balance, and appends the ledger entry — all
    /// on the caller's transaction.
    pub(crate) async fn apply_movement_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateStockMovement,
    ) -> Result<(StockMovement, Product), AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            FROM products
            WHERE product_id = $1 AND is_active = TRUE
            FOR UPDATE
            "#,
        )
        .bind(input.product_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock product: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Product not found: {}", input.product_id))
        })?;

        let previous_stock = product.stock;
        let new_stock = match input.movement_type {
            MovementType::In => previous_stock + input.quantity,
            MovementType::Out => {
                if input.quantity > previous_stock {
                    return Err(AppError::InsufficientStock(anyhow::anyhow!(
                        "Product {} has stock {}, requested {}",
                        product.code,
                        previous_stock,
                        input.quantity
                    )));
                }
                previous_stock - input.quantity
            }
        };

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock = $2, updated_utc = NOW()
            WHERE product_id = $1
            RETURNING product_id, code, brand, description, stock, minimum_stock, price,
                expiry_date, is_active, created_utc, updated_utc
            "#,
        )
        .bind(input.product_id)
        .bind(new_stock)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update stock: {}", e)))?;

        let movement_id = Uuid::new_v4();
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                movement_id, product_id, movement_type, quantity,
                previous_stock, new_stock, description, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING movement_id, product_id, movement_type, quantity,
                previous_stock, new_stock, description, created_by, created_utc
            "#,
        )
        .bind(movement_id)
        .bind(input.product_id)
        .bind(input.movement_type.as_str())
        .bind(input.quantity)
        .bind(previous_stock)
        .bind(new_stock)
        .bind(&input.description)
        .bind(&input.created_by)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert movement: {}", e))
        })?;

        Ok((movement, product))
    }

    /// Apply a batch of absolute stock levels as one all-or-nothing
    /// transaction, generating a ledger entry per changed item.
    ///
    /// An item whose target equals the current stock is returned unchanged
    /// and produces no ledger entry.
    #[instrument(skip(self, updates), fields(item_count = updates.len()))]
    pub async fn update_stock_bulk(
        &self,
        updates: &[StockUpdate],
        created_by: Option<&str>,
    ) -> Result<Vec<Product>, AppError> {
        for update in updates {
            if update.new_stock < 0 {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Stock must not be negative: {}",
                    update.product_id
                )));
            }
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_stock_bulk"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT product_id, code, brand, description, stock, minimum_stock, price,
                    expiry_date, is_active, created_utc, updated_utc
                FROM products
                WHERE product_id = $1 AND is_active = TRUE
                FOR UPDATE
                "#,
            )
            .bind(update.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to lock product: {}", e))
            })?;

            let product = match product {
                Some(p) => p,
                None => {
                    BULK_UPDATES_TOTAL
                        .with_label_values(&["stock", "rolled_back"])
                        .inc();
                    return Err(AppError::NotFound(anyhow::anyhow!(
                        "Product not found: {}",
                        update.product_id
                    )));
                }
            };

            let difference = update.new_stock - product.stock;
            if difference == 0 {
                results.push(product);
                continue;
            }

            let movement_input = CreateStockMovement {
                product_id: update.product_id,
                movement_type: MovementType::for_delta(difference),
                quantity: difference.abs(),
                description: update.description.clone(),
                created_by: created_by.map(str::to_string),
            };

            let (_, product) = match self.apply_movement_tx(&mut tx, &movement_input).await {
                Ok(applied) => applied,
                Err(e) => {
                    BULK_UPDATES_TOTAL
                        .with_label_values(&["stock", "rolled_back"])
                        .inc();
                    return Err(e);
                }
            };

            STOCK_MOVEMENTS_TOTAL
                .with_label_values(&[movement_input.movement_type.as_str()])
                .inc();
            results.push(product);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        BULK_UPDATES_TOTAL
            .with_label_values(&["stock", "committed"])
            .inc();

        info!(item_count = updates.len(), "Bulk stock update committed");

        Ok(results)
    }

    /// Apply a batch of price changes as one all-or-nothing transaction,
    /// writing a price-history row per item.
    #[instrument(skip(self, updates), fields(item_count = updates.len()))]
    pub async fn update_price_bulk(
        &self,
        updates: &[PriceUpdate],
    ) -> Result<Vec<Product>, AppError> {
        for update in updates {
            if update.new_price < Decimal::ZERO {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Price must not be negative: {}",
                    update.product_id
                )));
            }
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_price_bulk"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT product_id, code, brand, description, stock, minimum_stock, price,
                    expiry_date, is_active, created_utc, updated_utc
                FROM products
                WHERE product_id = $1 AND is_active = TRUE
                FOR UPDATE
                "#,
            )
            .bind(update.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to lock product: {}", e))
            })?;

            let product = match product {
                Some(p) => p,
                None => {
                    BULK_UPDATES_TOTAL
                        .with_label_values(&["price", "rolled_back"])
                        .inc();
                    return Err(AppError::NotFound(anyhow::anyhow!(
                        "Product not found: {}",
                        update.product_id
                    )));
                }
            };

            let price_history_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO price_history (
                    price_history_id, product_id, old_price, new_price, changed_by, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(price_history_id)
            .bind(update.product_id)
            .bind(product.price)
            .bind(update.new_price)
            .bind(&update.changed_by)
            .bind(&update.reason)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert price history: {}", e))
            })?;

            let updated = sqlx::query_as::<_, Product>(
                r#"
                UPDATE products
                SET price = $2, updated_utc = NOW()
                WHERE product_id = $1
                RETURNING product_id, code, brand, description, stock, minimum_stock, price,
                    expiry_date, is_active, created_utc, updated_utc
                "#,
            )
            .bind(update.product_id)
            .bind(update.new_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update price: {}", e))
            })?;

            results.push(updated);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        BULK_UPDATES_TOTAL
            .with_label_values(&["price", "committed"])
            .inc();

        info!(item_count = updates.len(), "Bulk price update committed");

        Ok(results)
    }

    /// List ledger entries with optional product and date filters, newest
    /// first, joined with product display fields.
    #[instrument(skip(self, filter))]
    pub async fn list_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovementWithProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_movements"])
            .start_timer();

        let limit = if filter.limit > 0 { filter.limit } else { 100 }.min(500) as i64;

        let movements = sqlx::query_as::<_, StockMovementWithProduct>(
            r#"
            SELECT m.movement_id, m.product_id, m.movement_type, m.quantity,
                m.previous_stock, m.new_stock, m.description, m.created_by, m.created_utc,
                p.code AS product_code, p.brand AS product_brand,
                p.description AS product_description
            FROM stock_movements m
            JOIN products p ON p.product_id = m.product_id
            WHERE ($1::uuid IS NULL OR m.product_id = $1)
              AND ($2::date IS NULL OR m.created_utc::date >= $2)
              AND ($3::date IS NULL OR m.created_utc::date <= $3)
            ORDER BY m.created_utc DESC
            LIMIT $4
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list movements: {}", e)))?;

        timer.observe_duration();

        Ok(movements)
    }
}
