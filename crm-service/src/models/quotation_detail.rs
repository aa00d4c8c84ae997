//! Quotation detail (line item) model for crm-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Compute the monetary value of one quotation line.
///
/// This is the only place a line total is ever produced; every create and
/// update path calls it and stores the result. Callers guarantee
/// `quantity >= 1`, `unit_price >= 0`, and `discount` in [0, 100], which
/// keeps the result non-negative.
pub fn line_total(quantity: i32, unit_price: Decimal, discount: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price * (Decimal::ONE - discount / Decimal::ONE_HUNDRED)
}

/// One line of a quotation.
///
/// `line_total` is derived from quantity, unit price, and discount; it is
/// never accepted from a caller.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotationDetail {
    pub detail_id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Detail joined with product display fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuotationDetailWithProduct {
    pub detail_id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub product_code: String,
    pub product_brand: String,
    pub product_description: String,
}

/// Input for creating a detail. `unit_price` defaults to the product's
/// current price when omitted; `discount` defaults to zero.
#[derive(Debug, Clone)]
pub struct CreateQuotationDetail {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

/// Input for updating a detail. Untouched fields keep their stored values;
/// the line total is recomputed from the merged result.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuotationDetail {
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn line_total_applies_discount() {
        // 3 * 100.00 at 10% off
        assert_eq!(line_total(3, dec("100.00"), dec("10")), dec("270.00"));
    }

    #[test]
    fn line_total_without_discount() {
        assert_eq!(line_total(4, dec("12.50"), Decimal::ZERO), dec("50.00"));
    }

    #[test]
    fn line_total_full_discount_is_zero() {
        assert_eq!(line_total(7, dec("99.99"), dec("100")), Decimal::ZERO);
    }

    #[test]
    fn line_total_fractional_discount() {
        assert_eq!(line_total(1, dec("200.00"), dec("12.5")), dec("175.00"));
    }
}
