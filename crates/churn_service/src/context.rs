//! Immutable per-process service state
//!
//! Built once at start-up and shared behind an `Arc`. The loaded model never
//! changes for the lifetime of the process; only the request counter moves.

use crate::config::ServiceConfig;
use axum::http::StatusCode;
use churn_core::{
    ChurnError, FeaturePayload, ModelArtifact, ModelStore, RawRecord, Result, UnknownCategoryPolicy,
    UnknownKeyPolicy,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug)]
pub enum ModelState {
    Ready(ModelArtifact),
    /// No model could be loaded; the reason is reported to callers
    Unavailable(String),
}

#[derive(Debug)]
pub struct ServiceContext {
    model: ModelState,
    unknown_keys: UnknownKeyPolicy,
    unknown_categories: UnknownCategoryPolicy,
    unavailable_status: StatusCode,
    start_time: Instant,
    req_count: AtomicU64,
}

pub type SharedContext = Arc<ServiceContext>;

impl ServiceContext {
    fn build(model: ModelState, config: &ServiceConfig) -> Self {
        Self {
            model,
            unknown_keys: config.unknown_keys,
            unknown_categories: config.unknown_categories,
            unavailable_status: config.unavailable_status,
            start_time: Instant::now(),
            req_count: AtomicU64::new(0),
        }
    }

    pub fn with_model(artifact: ModelArtifact, config: &ServiceConfig) -> Self {
        Self::build(ModelState::Ready(artifact), config)
    }

    pub fn unavailable(reason: impl Into<String>, config: &ServiceConfig) -> Self {
        Self::build(ModelState::Unavailable(reason.into()), config)
    }

    /// Load the configured model from its store.
    ///
    /// A failed load does not abort start-up: the context comes up in the
    /// unavailable state and prediction routes answer with
    /// `unavailable_status`.
    pub fn load(config: &ServiceConfig) -> Self {
        let store = ModelStore::new(&config.model_dir);
        match store.load(&config.model_key) {
            Ok(artifact) => {
                info!(
                    model = %artifact.key,
                    features = artifact.schema.len(),
                    schema_hash = %artifact.schema.hash(),
                    "model loaded"
                );
                Self::with_model(artifact, config)
            }
            Err(err) => {
                error!(
                    model = %config.model_key,
                    dir = %config.model_dir.display(),
                    "failed to load model: {err}"
                );
                Self::unavailable(err.to_string(), config)
            }
        }
    }

    pub fn model(&self) -> &ModelState {
        &self.model
    }

    /// The loaded artifact, or `ModelUnavailable`
    pub fn artifact(&self) -> Result<&ModelArtifact> {
        match &self.model {
            ModelState::Ready(artifact) => Ok(artifact),
            ModelState::Unavailable(reason) => Err(ChurnError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.model, ModelState::Ready(_))
    }

    pub fn predict_payload(&self, payload: &FeaturePayload) -> Result<u8> {
        self.artifact()?.predict_payload(payload, self.unknown_keys)
    }

    pub fn predict_record(&self, record: &RawRecord) -> Result<u8> {
        self.artifact()?.predict_record(record, self.unknown_categories)
    }

    pub fn unavailable_status(&self) -> StatusCode {
        self.unavailable_status
    }

    /// Count a request and return the new total
    pub fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.req_count.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_degrades_to_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            model_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        };

        let ctx = ServiceContext::load(&config);
        assert!(!ctx.is_ready());
        assert!(matches!(
            ctx.predict_payload(&vec![0.0; 37].into()),
            Err(ChurnError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_request_counter() {
        let ctx = ServiceContext::unavailable("none", &ServiceConfig::default());
        assert_eq!(ctx.record_request(), 1);
        assert_eq!(ctx.record_request(), 2);
        assert_eq!(ctx.request_count(), 2);
    }
}
