//! Churn prediction HTTP service
//!
//! Loads one stored model at start-up and serves predictions for it. A
//! missing or corrupt model leaves the service running in a degraded state
//! where prediction routes fail fast.

pub mod config;
pub mod context;
pub mod errors;
pub mod server;

pub use config::{ConfigOverrides, ServiceConfig, DEFAULT_CONFIG_PATH};
pub use context::{ModelState, ServiceContext, SharedContext};
pub use errors::{Result, ServiceError};
pub use server::{build_router, start_server, ApiError};
