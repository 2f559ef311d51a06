//! Error types for the churn core

use thiserror::Error;

/// Errors raised while encoding, aligning, loading or running a model
#[derive(Error, Debug)]
pub enum ChurnError {
    /// No classifier is loaded; predictions cannot be served
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model store has no artifact under the requested key
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Input vector length differs from the canonical schema length
    #[error("Schema mismatch: expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// Named input omits a required canonical column
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// Named input carries a key the schema does not know
    #[error("Unexpected feature: {0}")]
    UnexpectedFeature(String),

    /// Categorical value was not part of the vocabulary fitted at training time
    #[error("Unseen category {value:?} for attribute {attribute}")]
    UnseenCategory { attribute: String, value: String },

    /// Value could not be interpreted as the expected type
    #[error("Type mismatch for {attribute}: expected {expected}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },

    /// Fitting was attempted on an empty collection
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Schema or encoder definition is structurally invalid
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Stored hash does not match the loaded content
    #[error("Integrity check failed: {0}")]
    IntegrityFailure(String),

    /// Classifier could not produce a prediction
    #[error("Prediction failed: {0}")]
    PredictionFailure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChurnError {
    /// Whether the error was caused by the caller's input rather than by the
    /// service state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChurnError::SchemaMismatch { .. }
                | ChurnError::MissingFeature(_)
                | ChurnError::UnexpectedFeature(_)
                | ChurnError::UnseenCategory { .. }
                | ChurnError::TypeMismatch { .. }
                | ChurnError::PredictionFailure(_)
        )
    }
}

/// Result type for churn core operations
pub type Result<T> = std::result::Result<T, ChurnError>;
