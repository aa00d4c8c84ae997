//! Customer model for crm-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer record. Deletion is always a soft delete (`is_active = false`)
/// because quotations and reminders hold durable references to the row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub customer_code: String,
    pub company_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a customer. The customer code is generated, never
/// supplied by the caller.
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub company_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a customer. The code is immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomer {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}
