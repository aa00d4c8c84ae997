//! Stock ledger and bulk update endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateStockMovement, MinimumStockUpdate, MovementFilter, MovementType, PriceUpdate, Product,
    StockMovement, StockUpdate,
};
use crate::startup::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/stock/movements",
            get(list_movements).post(create_movement),
        )
        .route("/stock/bulk", put(update_stock_bulk))
        .route("/stock/minimum-bulk", put(update_minimum_stock_bulk))
        .route("/price/bulk", put(update_price_bulk))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyMovementRequest {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 512))]
    pub description: String,
    pub created_by: Option<String>,
}

/// The applied ledger entry together with the product it updated.
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub movement: StockMovement,
    pub product: Product,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkStockRequest {
    #[validate(length(min = 1))]
    pub updates: Vec<StockUpdate>,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkPriceRequest {
    #[validate(length(min = 1))]
    pub updates: Vec<PriceUpdate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkMinimumStockRequest {
    #[validate(length(min = 1))]
    pub updates: Vec<MinimumStockUpdate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MovementQuery {
    pub product_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i32>,
}

async fn create_movement(
    State(state): State<AppState>,
    Json(request): Json<ApplyMovementRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let input = CreateStockMovement {
        product_id: request.product_id,
        movement_type: request.movement_type,
        quantity: request.quantity,
        description: request.description,
        created_by: request.created_by,
    };
    let (movement, product) = state.db.create_stock_movement(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MovementResponse { movement, product }),
    ))
}

async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = MovementFilter {
        product_id: query.product_id,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit.unwrap_or(0),
    };
    let movements = state.db.list_movements(&filter).await?;
    Ok(Json(movements))
}

async fn update_stock_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let products = state
        .db
        .update_stock_bulk(&request.updates, request.created_by.as_deref())
        .await?;
    Ok(Json(products))
}

async fn update_price_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkPriceRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let products = state.db.update_price_bulk(&request.updates).await?;
    Ok(Json(products))
}

async fn update_minimum_stock_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkMinimumStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let products = state
        .db
        .update_minimum_stock_bulk(&request.updates)
        .await?;
    Ok(Json(products))
}
