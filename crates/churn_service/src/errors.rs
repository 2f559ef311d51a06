//! Error types for the prediction service

use churn_core::ChurnError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// A configuration value is present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration sources could not be read or merged
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Core(#[from] ChurnError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
