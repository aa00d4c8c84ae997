//! Product model for crm-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product record.
///
/// `stock` and `price` are never written through the generic update path:
/// stock changes go through the stock ledger and price changes through the
/// price-history path, each pairing the field write with its audit row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub code: String,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    pub minimum_stock: i32,
    pub price: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a product. `stock` here is the opening balance.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub code: String,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    pub minimum_stock: i32,
    pub price: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

/// Input for updating a product. Deliberately has no stock or price field.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub code: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub minimum_stock: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
}

/// A product at or below its minimum stock, with the shortage amount.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockProduct {
    pub product_id: Uuid,
    pub code: String,
    pub brand: String,
    pub description: String,
    pub stock: i32,
    pub minimum_stock: i32,
    pub shortage: i32,
}

/// One item of a bulk minimum-stock update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumStockUpdate {
    pub product_id: Uuid,
    pub minimum_stock: i32,
}
