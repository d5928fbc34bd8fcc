//! Shared domain records and configuration for Market Mind.

pub mod app_config;
pub mod config;
pub mod records;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, IntegrityPolicy};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use records::{Match, Product, TrendRecord, DEFAULT_MAX_MATCHES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
