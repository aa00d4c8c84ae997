//! HTTP API for crm-service.
//!
//! Thin axum handlers over the database service: deserialize + validate the
//! request, call the service, map the result to JSON. All domain rules live
//! in the services layer.

use axum::Router;
use rust_decimal::Decimal;
use validator::ValidationError;

use crate::startup::AppState;

pub mod customers;
pub mod products;
pub mod quotations;
pub mod reminders;
pub mod stock;

/// Assemble the /api router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(customers::router())
        .merge(products::router())
        .merge(quotations::router())
        .merge(reminders::router())
        .merge(stock::router())
}

/// Money and quantity fields must not be negative.
pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    Ok(())
}

/// Discounts are flat percentages in [0, 100].
pub(crate) fn validate_discount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("discount_out_of_range"));
    }
    Ok(())
}
