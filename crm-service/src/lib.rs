//! CRM Service - customers, inventory, and quotations behind a REST API.

pub mod config;
pub mod http;
pub mod models;
pub mod services;
pub mod startup;
