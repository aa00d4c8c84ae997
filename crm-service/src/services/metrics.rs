//! Prometheus metrics for crm-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "crm_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Stock movement counter by direction.
pub static STOCK_MOVEMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "crm_stock_movements_total",
        "Total number of stock ledger entries by direction",
        &["movement_type"]
    )
    .expect("Failed to register stock_movements_total")
});

/// Bulk update counter by kind and outcome.
pub static BULK_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "crm_bulk_updates_total",
        "Total number of bulk update batches by kind and outcome",
        &["kind", "outcome"] // stock/price/minimum_stock, committed/rolled_back
    )
    .expect("Failed to register bulk_updates_total")
});

/// Quotation operation counter.
pub static QUOTATION_OPERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "crm_quotation_operations_total",
        "Total number of quotation operations",
        &["operation"] // create, update, delete, add_detail, update_detail, delete_detail
    )
    .expect("Failed to register quotation_operations_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "crm_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&STOCK_MOVEMENTS_TOTAL);
    Lazy::force(&BULK_UPDATES_TOTAL);
    Lazy::force(&QUOTATION_OPERATIONS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
