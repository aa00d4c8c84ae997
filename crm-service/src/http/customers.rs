//! Customer endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateCustomer, UpdateCustomer};
use crate::startup::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/code/:code", get(get_customer_by_code))
        .route(
            "/customers/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub phone: String,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}

impl CreateCustomerRequest {
    fn into_input(self) -> CreateCustomer {
        CreateCustomer {
            company_name: self.company_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            tax_office: self.tax_office,
            tax_number: self.tax_number,
            contact_person: self.contact_person,
            contact_phone: self.contact_phone,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub company_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}

impl UpdateCustomerRequest {
    fn into_input(self) -> UpdateCustomer {
        UpdateCustomer {
            company_name: self.company_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            tax_office: self.tax_office,
            tax_number: self.tax_number,
            contact_person: self.contact_person,
            contact_phone: self.contact_phone,
            notes: self.notes,
        }
    }
}

async fn list_customers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let customers = state.db.list_customers().await?;
    Ok(Json(customers))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let customer = state.db.create_customer(&request.into_input()).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .db
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found: {}", customer_id)))?;
    Ok(Json(customer))
}

async fn get_customer_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .db
        .get_customer_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found: {}", code)))?;
    Ok(Json(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let customer = state
        .db
        .update_customer(customer_id, &request.into_input())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found: {}", customer_id)))?;
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_customer(customer_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Customer not found: {}",
            customer_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
