//! Churn classifiers
//!
//! Three inference-side model kinds share the [`Classifier`] trait:
//! - `lr`: [`LogisticRegression`]
//! - `rfc`: [`RandomForest`]
//! - `xgbc`: [`GradientBoostedTrees`]
//!
//! [`TrainedClassifier`] wraps them for persistence.

pub mod boosting;
pub mod forest;
pub mod logistic;
pub mod tree;

pub use boosting::GradientBoostedTrees;
pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use tree::{Node, Tree};

use crate::errors::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Probability at or above which a row is labelled as churn
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary churn classifier over fixed-width numeric rows
pub trait Classifier {
    /// Number of input columns the classifier was trained on
    fn feature_count(&self) -> usize;

    /// Churn probability for a row already known to have the right width
    fn predict_proba_row(&self, row: &[f64]) -> f64;

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.feature_count() {
            return Err(ChurnError::SchemaMismatch {
                expected: self.feature_count(),
                actual: row.len(),
            });
        }
        Ok(())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                self.check_width(row)?;
                Ok(self.predict_proba_row(row))
            })
            .collect()
    }

    /// 0/1 labels, one per row
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(label_for)
            .collect())
    }

    fn predict_one(&self, row: &[f64]) -> Result<u8> {
        self.check_width(row)?;
        let proba = self.predict_proba_row(row);
        if !proba.is_finite() {
            return Err(ChurnError::PredictionFailure(format!(
                "non-finite probability {proba}"
            )));
        }
        Ok(label_for(proba))
    }
}

fn label_for(proba: f64) -> u8 {
    u8::from(proba >= DECISION_THRESHOLD)
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Classifier family, doubling as the model store key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "lr")]
    LogisticRegression,
    #[serde(rename = "rfc")]
    RandomForest,
    #[serde(rename = "xgbc")]
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LogisticRegression,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    pub fn as_key(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "lr",
            ModelKind::RandomForest => "rfc",
            ModelKind::GradientBoosting => "xgbc",
        }
    }
}

impl FromStr for ModelKind {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_key() == s.trim())
            .ok_or_else(|| ChurnError::ModelNotFound(s.to_string()))
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Persistable classifier of any supported kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedClassifier {
    Logistic(LogisticRegression),
    Forest(RandomForest),
    Boosted(GradientBoostedTrees),
}

impl TrainedClassifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedClassifier::Logistic(_) => ModelKind::LogisticRegression,
            TrainedClassifier::Forest(_) => ModelKind::RandomForest,
            TrainedClassifier::Boosted(_) => ModelKind::GradientBoosting,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            TrainedClassifier::Logistic(model) => model.validate(),
            TrainedClassifier::Forest(model) => model.validate(),
            TrainedClassifier::Boosted(model) => model.validate(),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedClassifier::Logistic(model) => model,
            TrainedClassifier::Forest(model) => model,
            TrainedClassifier::Boosted(model) => model,
        }
    }
}

impl Classifier for TrainedClassifier {
    fn feature_count(&self) -> usize {
        self.inner().feature_count()
    }

    fn predict_proba_row(&self, row: &[f64]) -> f64 {
        self.inner().predict_proba_row(row)
    }
}

impl From<LogisticRegression> for TrainedClassifier {
    fn from(model: LogisticRegression) -> Self {
        TrainedClassifier::Logistic(model)
    }
}

impl From<RandomForest> for TrainedClassifier {
    fn from(model: RandomForest) -> Self {
        TrainedClassifier::Forest(model)
    }
}

impl From<GradientBoostedTrees> for TrainedClassifier {
    fn from(model: GradientBoostedTrees) -> Self {
        TrainedClassifier::Boosted(model)
    }
}

/// Fraction of predictions equal to the labels
pub fn accuracy(predicted: &[u8], labels: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    correct as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_keys() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_key().parse::<ModelKind>().unwrap(), kind);
        }
        assert!(matches!(
            "svm".parse::<ModelKind>(),
            Err(ChurnError::ModelNotFound(_))
        ));
        assert_eq!(
            serde_json::to_string(&ModelKind::GradientBoosting).unwrap(),
            "\"xgbc\""
        );
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_width_checked_before_prediction() {
        let model = TrainedClassifier::from(LogisticRegression::new(
            vec![1.0, -1.0],
            0.0,
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        ));
        assert_eq!(model.predict(&[vec![2.0, 0.0], vec![0.0, 2.0]]).unwrap(), vec![1, 0]);
        assert!(matches!(
            model.predict_one(&[1.0]),
            Err(ChurnError::SchemaMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
