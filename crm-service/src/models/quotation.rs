//! Quotation model for crm-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::quotation_detail::CreateQuotationDetail;

/// Quotation status.
///
/// The intended forward path is draft -> sent -> accepted/rejected, but the
/// data layer accepts any transition; enforcing legality is a caller-side
/// policy concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "draft",
            QuotationStatus::Sent => "sent",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => QuotationStatus::Sent,
            "accepted" => QuotationStatus::Accepted,
            "rejected" => QuotationStatus::Rejected,
            _ => QuotationStatus::Draft,
        }
    }
}

/// Quotation record.
///
/// `total_amount` is derived: it equals the sum of `line_total` over the
/// quotation's details and is recomputed inside the same transaction as every
/// detail mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    pub quotation_id: Uuid,
    pub quotation_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
    pub valid_until: NaiveDate,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Quotation joined with customer display fields for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuotationWithCustomer {
    pub quotation_id: Uuid,
    pub quotation_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
    pub valid_until: NaiveDate,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub customer_code: String,
    pub customer_name: String,
}

/// Input for creating a quotation. The number is generated; the total is
/// computed from the details, never supplied.
#[derive(Debug, Clone)]
pub struct CreateQuotation {
    pub customer_id: Uuid,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub details: Vec<CreateQuotationDetail>,
}

/// Input for updating a quotation. When `details` is present the existing
/// detail rows are replaced wholesale, not merged.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuotation {
    pub status: Option<QuotationStatus>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub details: Option<Vec<CreateQuotationDetail>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_roundtrip() {
        for status in [
            QuotationStatus::Draft,
            QuotationStatus::Sent,
            QuotationStatus::Accepted,
            QuotationStatus::Rejected,
        ] {
            assert_eq!(QuotationStatus::from_string(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_defaults_to_draft() {
        assert_eq!(
            QuotationStatus::from_string("something-else"),
            QuotationStatus::Draft
        );
    }
}
