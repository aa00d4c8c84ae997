//! Price history model for crm-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One entry in the append-only price audit trail. Written exactly once per
/// price change, in the same transaction as the product update.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceHistory {
    pub price_history_id: Uuid,
    pub product_id: Uuid,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub changed_by: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// One item of a bulk price update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub product_id: Uuid,
    pub new_price: Decimal,
    pub reason: Option<String>,
    pub changed_by: Option<String>,
}
