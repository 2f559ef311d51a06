//! Gradient-boosted trees with logistic loss

use super::{sigmoid, Classifier, Tree};
use crate::errors::{ChurnError, Result};
use serde::{Deserialize, Serialize};

/// `p = sigmoid(base_score + learning_rate · Σ tree(x))`, leaves in log-odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    feature_count: usize,
    base_score: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    pub fn new(feature_count: usize, base_score: f64, learning_rate: f64, trees: Vec<Tree>) -> Self {
        Self {
            feature_count,
            base_score,
            learning_rate,
            trees,
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Raw margin (log-odds) for one row
    pub fn margin(&self, row: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + self.learning_rate * tree.evaluate(row))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_score.is_finite() {
            return Err(ChurnError::InvalidSchema("non-finite base score".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ChurnError::InvalidSchema(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for tree in &self.trees {
            tree.validate(self.feature_count)?;
        }
        Ok(())
    }
}

impl Classifier for GradientBoostedTrees {
    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict_proba_row(&self, row: &[f64]) -> f64 {
        sigmoid(self.margin(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    #[test]
    fn test_margin_accumulates_scaled_leaves() {
        let tree = Tree::new(vec![
            Node::internal(0, 0, 0.5, 1, 2),
            Node::leaf(1, -2.0),
            Node::leaf(2, 2.0),
        ]);
        let model = GradientBoostedTrees::new(1, 0.1, 0.5, vec![tree.clone(), tree]);

        assert!((model.margin(&[0.0]) - (0.1 - 2.0)).abs() < 1e-12);
        assert!((model.margin(&[1.0]) - (0.1 + 2.0)).abs() < 1e-12);
        assert_eq!(model.predict(&[vec![0.0], vec![1.0]]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_no_trees_predicts_base_score() {
        let model = GradientBoostedTrees::new(2, 0.0, 0.1, Vec::new());
        assert!(model.validate().is_ok());
        assert_eq!(model.predict_proba_row(&[3.0, 4.0]), 0.5);
    }

    #[test]
    fn test_validate_learning_rate() {
        assert!(GradientBoostedTrees::new(1, 0.0, 0.0, Vec::new()).validate().is_err());
    }
}
