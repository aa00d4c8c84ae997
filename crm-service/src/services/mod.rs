//! Services module for crm-service.

pub mod customers;
pub mod database;
pub mod metrics;
pub mod products;
pub mod quotations;
pub mod reminders;
pub mod sequence;
pub mod stock;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
