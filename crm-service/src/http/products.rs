//! Product endpoints.
//!
//! The update endpoint cannot touch stock or price: its request type has no
//! such fields, so a client sending them gets them silently dropped and the
//! audited paths under /stock and /price stay the only writers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use super::validate_non_negative;
use crate::models::{CreateProduct, UpdateProduct};
use crate::startup::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/alerts", get(list_low_stock))
        .route("/products/expiring", get(list_expiring))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/price-history", get(list_price_history))
        .route("/products/:id/minimum-stock", put(update_minimum_stock))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub brand: String,
    #[validate(length(min = 1, max = 512))]
    pub description: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub minimum_stock: i32,
    #[validate(custom(function = "validate_non_negative"))]
    pub price: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

impl CreateProductRequest {
    fn into_input(self) -> CreateProduct {
        CreateProduct {
            code: self.code,
            brand: self.brand,
            description: self.description,
            stock: self.stock,
            minimum_stock: self.minimum_stock,
            price: self.price,
            expiry_date: self.expiry_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 512))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub minimum_stock: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
}

impl UpdateProductRequest {
    fn into_input(self) -> UpdateProduct {
        UpdateProduct {
            code: self.code,
            brand: self.brand,
            description: self.description,
            minimum_stock: self.minimum_stock,
            expiry_date: self.expiry_date,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MinimumStockRequest {
    #[validate(range(min = 0))]
    pub minimum_stock: i32,
}

async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let products = state.db.list_products().await?;
    Ok(Json(products))
}

async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let product = state.db.create_product(&request.into_input()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found: {}", product_id)))?;
    Ok(Json(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let product = state
        .db
        .update_product(product_id, &request.into_input())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found: {}", product_id)))?;
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_product(product_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Product not found: {}",
            product_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let alerts = state.db.list_low_stock().await?;
    Ok(Json(alerts))
}

async fn list_expiring(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<impl IntoResponse, AppError> {
    let days = query.days.unwrap_or(90);
    if days < 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Day threshold must not be negative"
        )));
    }
    let products = state.db.list_expiring(days).await?;
    Ok(Json(products))
}

async fn list_price_history(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.db.list_price_history(product_id).await?;
    Ok(Json(history))
}

async fn update_minimum_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<MinimumStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let product = state
        .db
        .update_minimum_stock(product_id, request.minimum_stock)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found: {}", product_id)))?;
    Ok(Json(product))
}
