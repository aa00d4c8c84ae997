//! Configuration for crm-service.

use serde::Deserialize;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrmConfig {
    #[serde(default)]
    pub common: CoreConfig,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
}

fn default_service_name() -> String {
    "crm-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CrmConfig {
    /// Load configuration from `configuration.*` files and `APP__`-prefixed
    /// environment variables (e.g. `APP__DATABASE__URL`).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
