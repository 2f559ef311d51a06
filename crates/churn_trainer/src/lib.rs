//! Churn trainer
//!
//! Loads a labelled CSV, fits the feature encoder and one of the three
//! classifier kinds, scores it on a seeded hold-out split and packages the
//! result as a [`churn_core::ModelArtifact`].

pub mod boosting;
pub mod cart;
pub mod dataset;
pub mod errors;
pub mod forest;
pub mod logistic;
pub mod trainer;

use churn_core::ModelArtifact;
use std::path::Path;

pub use boosting::BoostingConfig;
pub use cart::{CartBuilder, TreeConfig};
pub use dataset::{parse_label, Dataset, ID_COLUMN, TARGET_COLUMN};
pub use errors::TrainerError;
pub use forest::ForestConfig;
pub use logistic::LogisticConfig;
pub use trainer::{check_plan_schema, evaluate, infer_plan, ChurnTrainer, TrainingParams};

/// Train a model directly from a telco-style CSV using inferred encodings.
pub fn train_model_from_csv(path: &Path, params: TrainingParams) -> Result<ModelArtifact, TrainerError> {
    let mut dataset = Dataset::from_csv(path, TARGET_COLUMN, &[ID_COLUMN.to_string()])?;
    dataset.drop_non_numeric(&["TotalCharges"]);
    let plan = infer_plan(&dataset, &[], &[])?;
    ChurnTrainer::new(params).train(&dataset, &plan)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
