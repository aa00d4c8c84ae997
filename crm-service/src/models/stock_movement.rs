//! Stock movement model for crm-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "out" => MovementType::Out,
            _ => MovementType::In,
        }
    }

    /// Direction implied by a stock delta (`new_stock - current_stock`).
    pub fn for_delta(delta: i32) -> Self {
        if delta >= 0 {
            MovementType::In
        } else {
            MovementType::Out
        }
    }

    /// The signed stock effect of a movement of `quantity` in this direction.
    pub fn signed_delta(&self, quantity: i32) -> i32 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        }
    }
}

/// One entry in the append-only stock ledger. Written exactly once per
/// stock-affecting operation, in the same transaction as the product update;
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockMovement {
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub description: String,
    pub created_by: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Ledger entry joined with product display fields for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementWithProduct {
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub description: String,
    pub created_by: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub product_code: String,
    pub product_brand: String,
    pub product_description: String,
}

/// Input for applying a stock movement.
#[derive(Debug, Clone)]
pub struct CreateStockMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub description: String,
    pub created_by: Option<String>,
}

/// One item of a bulk stock update: the target balance, not a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_id: Uuid,
    pub new_stock: i32,
    pub description: String,
}

/// Filter parameters for listing ledger entries.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i32,
}
