//! Random forest: leaves hold the positive-class fraction, trees are averaged

use super::{Classifier, Tree};
use crate::errors::{ChurnError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    feature_count: usize,
    trees: Vec<Tree>,
}

impl RandomForest {
    pub fn new(feature_count: usize, trees: Vec<Tree>) -> Self {
        Self {
            feature_count,
            trees,
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ChurnError::InvalidSchema("forest has no trees".to_string()));
        }
        for tree in &self.trees {
            tree.validate(self.feature_count)?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict_proba_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(row)).sum();
        sum / self.trees.len() as f64
    }
}
