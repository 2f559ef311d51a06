//! End-to-end training: encode, split, fit, evaluate, package

use crate::boosting::{fit_boosting, BoostingConfig};
use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};
use crate::forest::{fit_forest, ForestConfig};
use crate::logistic::{fit_logistic, LogisticConfig};
use churn_core::{
    accuracy, align_named, Classifier, EncodedColumnSchema, EncodedRow, EncodingPlan,
    FeatureEncoder, ModelArtifact,
    ModelKind, ModelMetrics, TrainedClassifier, UnknownCategoryPolicy, UnknownKeyPolicy,
    SCHEMA_VERSION,
};
use serde::Serialize;
use tracing::{info, instrument};

/// Categorical columns with at most this many values are label encoded
pub const LABEL_MAX_CARDINALITY: usize = 2;

#[derive(Clone, Debug, Serialize)]
pub struct TrainingParams {
    pub kind: ModelKind,
    /// Held-out fraction
    pub test_size: f64,
    pub split_seed: u64,
    pub schema_version: u32,
    pub logistic: LogisticConfig,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            kind: ModelKind::LogisticRegression,
            test_size: 0.3,
            split_seed: 1,
            schema_version: SCHEMA_VERSION,
            logistic: LogisticConfig::default(),
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

/// Encoding plan for a raw dataset.
///
/// Explicit `one_hot` / `label` lists win. Otherwise numeric columns pass
/// through, two-valued categoricals are label encoded and the rest one-hot
/// encoded.
pub fn infer_plan(dataset: &Dataset, one_hot: &[String], label: &[String]) -> Result<EncodingPlan> {
    if !one_hot.is_empty() || !label.is_empty() {
        return Ok(EncodingPlan::for_columns(dataset.attributes(), one_hot, label)?);
    }

    let mut plan = EncodingPlan::new();
    for attribute in dataset.attributes() {
        plan = if dataset.is_numeric(attribute) {
            plan.numeric(attribute.clone())
        } else if dataset.cardinality(attribute) <= LABEL_MAX_CARDINALITY {
            plan.label(attribute.clone())
        } else {
            plan.one_hot(attribute.clone())
        };
    }
    Ok(plan)
}

/// Fail before any fitting when `plan` would not produce `expected`'s
/// columns in order. Only the encoder is fitted, which is cheap.
pub fn check_plan_schema(dataset: &Dataset, plan: &EncodingPlan, expected: &EncodedColumnSchema) -> Result<()> {
    let encoder = FeatureEncoder::fit(plan, dataset.records())?;
    expected.check_header(encoder.output_names().as_slice())?;
    Ok(())
}

pub struct ChurnTrainer {
    params: TrainingParams,
}

impl ChurnTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Fit the encoder on the whole dataset, the classifier on the training
    /// split, and score both splits.
    #[instrument(skip_all, fields(kind = %self.params.kind, rows = dataset.len()))]
    pub fn train(&self, dataset: &Dataset, plan: &EncodingPlan) -> Result<ModelArtifact> {
        let encoder = FeatureEncoder::fit(plan, dataset.records())?;
        let schema = encoder.schema(self.params.schema_version)?;
        info!(columns = schema.len(), schema_hash = %schema.hash(), "fitted feature encoder");

        let (train, test) = dataset.split(self.params.test_size, self.params.split_seed)?;
        let x_train = encoder
            .transform(train.records(), UnknownCategoryPolicy::Reject)?
            .to_rows();
        let x_test = encoder
            .transform(test.records(), UnknownCategoryPolicy::Reject)?
            .to_rows();

        let (classifier, oob_accuracy) = self.fit_classifier(&x_train, train.targets())?;
        let metrics = ModelMetrics {
            train_accuracy: accuracy(&classifier.predict(&x_train)?, train.targets()),
            test_accuracy: accuracy(&classifier.predict(&x_test)?, test.targets()),
            oob_accuracy,
            train_rows: train.len(),
            test_rows: test.len(),
        };
        info!(
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            "evaluation complete"
        );

        Ok(ModelArtifact::new(schema, Some(encoder), classifier, metrics)?)
    }

    /// Fit the configured classifier kind on encoded rows
    pub fn fit_classifier(&self, rows: &[Vec<f64>], targets: &[u8]) -> Result<(TrainedClassifier, Option<f64>)> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "{} rows for {} targets",
                rows.len(),
                targets.len()
            )));
        }

        Ok(match self.params.kind {
            ModelKind::LogisticRegression => {
                (fit_logistic(rows, targets, &self.params.logistic)?.into(), None)
            }
            ModelKind::RandomForest => {
                let (forest, oob) = fit_forest(rows, targets, &self.params.forest)?;
                (forest.into(), oob)
            }
            ModelKind::GradientBoosting => {
                (fit_boosting(rows, targets, &self.params.boosting)?.into(), None)
            }
        })
    }
}

/// Accuracy of a stored artifact on a labelled dataset.
///
/// Records go through the artifact's encoder when it has one; otherwise they
/// must already carry the encoded column names.
pub fn evaluate(artifact: &ModelArtifact, dataset: &Dataset, policy: UnknownCategoryPolicy) -> Result<f64> {
    let rows = match &artifact.encoder {
        Some(encoder) => encoder.transform(dataset.records(), policy)?.to_rows(),
        None => dataset
            .records()
            .iter()
            .map(|record| {
                align_named(record.as_map(), &artifact.schema, UnknownKeyPolicy::Ignore)
                    .map(EncodedRow::into_values)
            })
            .collect::<churn_core::Result<Vec<_>>>()?,
    };
    let predicted = artifact.classifier.predict(&rows)?;
    Ok(accuracy(&predicted, dataset.targets()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ID_COLUMN, TARGET_COLUMN};
    use churn_core::ColumnStrategy;

    fn dataset() -> Dataset {
        let mut csv = String::from("customerID,gender,Contract,tenure,Churn\n");
        let contracts = ["Month-to-month", "One year", "Two year"];
        for i in 0..60 {
            let contract = contracts[i % 3];
            let gender = if i % 2 == 0 { "Male" } else { "Female" };
            let churn = if contract == "Month-to-month" { "Yes" } else { "No" };
            csv.push_str(&format!("{i:04}-ABCDE,{gender},{contract},{},{churn}\n", i % 50));
        }
        Dataset::from_reader(csv.as_bytes(), TARGET_COLUMN, &[ID_COLUMN.to_string()]).unwrap()
    }

    #[test]
    fn test_infer_plan() {
        let plan = infer_plan(&dataset(), &[], &[]).unwrap();
        assert_eq!(
            plan.columns(),
            &[
                ("gender".to_string(), ColumnStrategy::Label),
                ("Contract".to_string(), ColumnStrategy::OneHot),
                ("tenure".to_string(), ColumnStrategy::Numeric),
            ]
        );
    }

    #[test]
    fn test_explicit_plan_overrides_inference() {
        let plan = infer_plan(&dataset(), &["gender".to_string()], &[]).unwrap();
        assert_eq!(plan.columns()[0], ("gender".to_string(), ColumnStrategy::OneHot));
        assert_eq!(plan.columns()[1], ("Contract".to_string(), ColumnStrategy::Numeric));
    }

    #[test]
    fn test_check_plan_schema() {
        let dataset = dataset();
        let plan = infer_plan(&dataset, &[], &[]).unwrap();

        let expected = EncodedColumnSchema::new(
            1,
            ["gender_enc", "Contract_Month-to-month", "Contract_One year", "Contract_Two year", "tenure"],
        )
        .unwrap();
        assert!(check_plan_schema(&dataset, &plan, &expected).is_ok());

        let err = check_plan_schema(&dataset, &plan, &EncodedColumnSchema::telco()).unwrap_err();
        assert!(matches!(
            err,
            TrainerError::Core(churn_core::ChurnError::SchemaMismatch {
                expected: 37,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_train_each_kind() {
        let dataset = dataset();
        let plan = infer_plan(&dataset, &[], &[]).unwrap();

        for kind in ModelKind::ALL {
            let mut params = TrainingParams {
                kind,
                ..TrainingParams::default()
            };
            params.forest.n_trees = 10;
            params.boosting.n_rounds = 40;
            params.boosting.learning_rate = 0.3;

            let artifact = ChurnTrainer::new(params).train(&dataset, &plan).unwrap();
            assert_eq!(artifact.kind, kind);
            assert_eq!(
                artifact.schema.columns(),
                &[
                    "gender_enc",
                    "Contract_Month-to-month",
                    "Contract_One year",
                    "Contract_Two year",
                    "tenure"
                ]
            );
            assert_eq!(artifact.metrics.train_rows, 42);
            assert_eq!(artifact.metrics.test_rows, 18);
            assert_eq!(artifact.metrics.test_accuracy, 1.0, "{kind}");
            assert_eq!(artifact.metrics.oob_accuracy.is_some(), kind == ModelKind::RandomForest);
            assert_eq!(
                evaluate(&artifact, &dataset, UnknownCategoryPolicy::Reject).unwrap(),
                1.0
            );
        }
    }
}
