//! Logistic regression over standardized inputs

use super::{sigmoid, Classifier};
use crate::errors::{ChurnError, Result};
use serde::{Deserialize, Serialize};

/// `p = sigmoid(intercept + Σ wᵢ · (xᵢ - meanᵢ) / scaleᵢ)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl LogisticRegression {
    pub fn new(weights: Vec<f64>, intercept: f64, means: Vec<f64>, scales: Vec<f64>) -> Self {
        Self {
            weights,
            intercept,
            means,
            scales,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Log-odds for one row
    pub fn decision(&self, row: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(row)
            .zip(self.means.iter().zip(&self.scales))
            .fold(self.intercept, |acc, ((w, x), (mean, scale))| {
                acc + w * (x - mean) / scale
            })
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.weights.len();
        if self.means.len() != n || self.scales.len() != n {
            return Err(ChurnError::InvalidSchema(format!(
                "logistic model has {n} weights, {} means and {} scales",
                self.means.len(),
                self.scales.len()
            )));
        }
        if !self.intercept.is_finite()
            || self.weights.iter().chain(&self.means).any(|v| !v.is_finite())
        {
            return Err(ChurnError::InvalidSchema(
                "logistic model has non-finite parameters".to_string(),
            ));
        }
        if self.scales.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(ChurnError::InvalidSchema(
                "logistic model scales must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Classifier for LogisticRegression {
    fn feature_count(&self) -> usize {
        self.weights.len()
    }

    fn predict_proba_row(&self, row: &[f64]) -> f64 {
        sigmoid(self.decision(row))
    }
}
