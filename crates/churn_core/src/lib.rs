//! Churn prediction core
//!
//! Turns raw customer attributes into the fixed-order numeric vector a
//! trained classifier expects, and runs that classifier.
//!
//! Modules:
//! - `record`: raw attribute values and records
//! - `encoding`: one-hot / label encoders and the fitted `FeatureEncoder`
//! - `schema`: canonical ordered column schema with content hash
//! - `align`: reindexing of positional or named payloads onto a schema
//! - `model`: the `Classifier` trait and the three model kinds
//! - `artifact`: classifier + schema + encoder bundle
//! - `store`: directory-backed artifact persistence with hash verification
//! - `serde_canon`: canonical JSON and BLAKE3 helpers

pub mod align;
pub mod artifact;
pub mod encoding;
pub mod errors;
pub mod model;
pub mod record;
pub mod schema;
pub mod serde_canon;
pub mod store;

pub use align::{align, align_named, align_positional, EncodedRow, FeaturePayload, UnknownKeyPolicy};
pub use artifact::{ModelArtifact, ModelMetrics};
pub use encoding::{
    label_encode, one_hot, CategoryVocabulary, ColumnStrategy, EncodedColumn, EncodedFrame,
    EncodingPlan, FeatureEncoder, FittedColumn, UnknownCategoryPolicy,
};
pub use errors::{ChurnError, Result};
pub use model::{
    accuracy, sigmoid, Classifier, GradientBoostedTrees, LogisticRegression, ModelKind, RandomForest,
    TrainedClassifier,
};
pub use record::{RawRecord, RawValue};
pub use schema::{EncodedColumnSchema, SCHEMA_VERSION, TELCO_FEATURE_COLUMNS};
pub use store::ModelStore;

/// Crate version string reported by the service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
