//! Quotation endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use super::{validate_discount, validate_non_negative};
use crate::models::{
    CreateQuotation, CreateQuotationDetail, Quotation, QuotationDetail,
    QuotationDetailWithProduct, QuotationStatus, UpdateQuotation, UpdateQuotationDetail,
};
use crate::startup::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quotations", get(list_quotations).post(create_quotation))
        .route(
            "/quotations/:id",
            get(get_quotation)
                .put(update_quotation)
                .delete(delete_quotation),
        )
        .route("/quotations/:id/details", post(add_detail))
        .route(
            "/quotations/details/:detail_id",
            put(update_detail).delete(delete_detail),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuotationDetailRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Option<Decimal>,
    #[validate(custom(function = "validate_discount"))]
    pub discount: Option<Decimal>,
}

impl QuotationDetailRequest {
    fn into_input(self) -> CreateQuotationDetail {
        CreateQuotationDetail {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationRequest {
    pub customer_id: Uuid,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub details: Vec<QuotationDetailRequest>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateQuotationRequest {
    pub status: Option<QuotationStatus>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(nested)]
    pub details: Option<Vec<QuotationDetailRequest>>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateQuotationDetailRequest {
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Option<Decimal>,
    #[validate(custom(function = "validate_discount"))]
    pub discount: Option<Decimal>,
}

/// A quotation with its detail rows.
#[derive(Debug, Serialize)]
pub struct QuotationResponse {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub details: Vec<QuotationDetailWithProduct>,
}

/// A mutated detail together with the recomputed parent quotation.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: QuotationDetail,
    pub quotation: Quotation,
}

async fn list_quotations(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quotations = state.db.list_quotations().await?;
    Ok(Json(quotations))
}

async fn create_quotation(
    State(state): State<AppState>,
    Json(request): Json<CreateQuotationRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let input = CreateQuotation {
        customer_id: request.customer_id,
        valid_until: request.valid_until,
        notes: request.notes,
        details: request
            .details
            .into_iter()
            .map(QuotationDetailRequest::into_input)
            .collect(),
    };
    let quotation = state.db.create_quotation(&input).await?;
    let details = state
        .db
        .get_quotation_details(quotation.quotation_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(QuotationResponse { quotation, details }),
    ))
}

async fn get_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quotation = state.db.get_quotation(quotation_id).await?.ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Quotation not found: {}", quotation_id))
    })?;
    let details = state.db.get_quotation_details(quotation_id).await?;
    Ok(Json(QuotationResponse { quotation, details }))
}

async fn update_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(request): Json<UpdateQuotationRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let input = UpdateQuotation {
        status: request.status,
        valid_until: request.valid_until,
        notes: request.notes,
        details: request.details.map(|details| {
            details
                .into_iter()
                .map(QuotationDetailRequest::into_input)
                .collect()
        }),
    };
    let quotation = state
        .db
        .update_quotation(quotation_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quotation not found: {}", quotation_id))
        })?;
    let details = state.db.get_quotation_details(quotation_id).await?;
    Ok(Json(QuotationResponse { quotation, details }))
}

async fn delete_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_quotation(quotation_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Quotation not found: {}",
            quotation_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_detail(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(request): Json<QuotationDetailRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let (detail, quotation) = state
        .db
        .add_quotation_detail(quotation_id, &request.into_input())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DetailResponse { detail, quotation }),
    ))
}

async fn update_detail(
    State(state): State<AppState>,
    Path(detail_id): Path<Uuid>,
    Json(request): Json<UpdateQuotationDetailRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let input = UpdateQuotationDetail {
        quantity: request.quantity,
        unit_price: request.unit_price,
        discount: request.discount,
    };
    let (detail, quotation) = state.db.update_quotation_detail(detail_id, &input).await?;
    Ok(Json(DetailResponse { detail, quotation }))
}

async fn delete_detail(
    State(state): State<AppState>,
    Path(detail_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quotation = state.db.delete_quotation_detail(detail_id).await?;
    Ok(Json(quotation))
}
