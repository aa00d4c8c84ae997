//! Period-scoped sequential code generation.
//!
//! Codes look like `CUS-202608001`: a prefix, the current year and month, and
//! a zero-padded counter that restarts each month. The counter lives in the
//! `sequence_counters` table and is advanced with a single atomic upsert, so
//! concurrent creations in the same period cannot hand out the same value.
//! The unique constraints on the code columns remain as a backstop; a
//! violation there surfaces as a conflict the caller may retry.

use chrono::{Datelike, NaiveDate};
use service_core::error::AppError;
use sqlx::{Postgres, Transaction};

use super::database::Database;

/// Prefix for generated customer codes.
pub const CUSTOMER_CODE_PREFIX: &str = "CUS";

/// Prefix for generated quotation numbers.
pub const QUOTATION_NUMBER_PREFIX: &str = "QUO";

/// Width of the zero-padded numeric suffix.
const SUFFIX_WIDTH: usize = 3;

/// The `YYYYMM` period key for a date.
pub fn period_key(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Render a full code from its parts, e.g. `("CUS", "202608", 7)` ->
/// `CUS-202608007`. Values beyond the suffix width keep all their digits.
pub fn format_code(prefix: &str, period: &str, value: i64) -> String {
    format!("{}-{}{:0width$}", prefix, period, value, width = SUFFIX_WIDTH)
}

impl Database {
    /// Reserve the next code for `prefix` in the current period, on the
    /// caller's transaction. A rolled-back caller leaves a gap in the
    /// sequence, which is acceptable; uniqueness and monotonicity are the
    /// contract.
    pub(crate) async fn next_code_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        prefix: &str,
        today: NaiveDate,
    ) -> Result<String, AppError> {
        let period = period_key(today);

        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (prefix, period, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (prefix, period)
            DO UPDATE SET last_value = sequence_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(prefix)
        .bind(&period)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance sequence: {}", e))
        })?;

        Ok(format_code(prefix, &period, value))
    }
}
