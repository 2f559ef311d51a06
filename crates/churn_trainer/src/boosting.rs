//! Gradient boosting with logistic loss
//!
//! Each round fits a CART tree to the gradients `p - y` and hessians
//! `p(1 - p)` of a row subsample, then adds `learning_rate · tree` to the
//! margin.

use crate::cart::{CartBuilder, TreeConfig};
use crate::errors::{Result, TrainerError};
use churn_core::{sigmoid, GradientBoostedTrees};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize)]
pub struct BoostingConfig {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// Fraction of rows sampled per round
    pub subsample: f64,
    pub lambda: f64,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_rounds: 300,
            learning_rate: 0.1,
            max_depth: 5,
            min_child_weight: 1.0,
            subsample: 0.5,
            lambda: 1.0,
            seed: 42,
        }
    }
}

pub fn fit_boosting(rows: &[Vec<f64>], targets: &[u8], config: &BoostingConfig) -> Result<GradientBoostedTrees> {
    let n = rows.len();
    let width = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| TrainerError::Training("no training rows".to_string()))?;
    if !(config.subsample > 0.0 && config.subsample <= 1.0) {
        return Err(TrainerError::Training(format!(
            "subsample must be in (0, 1], got {}",
            config.subsample
        )));
    }
    if !(config.learning_rate > 0.0) {
        return Err(TrainerError::Training(format!(
            "learning rate must be positive, got {}",
            config.learning_rate
        )));
    }

    let positive = targets.iter().filter(|&&y| y == 1).count() as f64 / n as f64;
    let p0 = positive.clamp(1e-6, 1.0 - 1e-6);
    let base_score = (p0 / (1.0 - p0)).ln();

    let tree_config = TreeConfig {
        max_depth: config.max_depth,
        min_samples_leaf: 1,
        min_child_weight: config.min_child_weight,
        lambda: config.lambda,
        max_features: None,
    };
    let sample_size = ((n as f64 * config.subsample).round() as usize).clamp(1, n);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut margins = vec![base_score; n];
    let mut gradients = vec![0.0; n];
    let mut hessians = vec![0.0; n];
    let mut trees = Vec::with_capacity(config.n_rounds);

    for round in 0..config.n_rounds {
        for i in 0..n {
            let p = sigmoid(margins[i]);
            gradients[i] = p - targets[i] as f64;
            hessians[i] = (p * (1.0 - p)).max(1e-16);
        }

        let mut sample = index::sample(&mut rng, n, sample_size).into_vec();
        sample.sort_unstable();

        let tree = CartBuilder::new(rows, &gradients, &hessians, tree_config.clone()).build(&sample, &mut rng);
        for (margin, row) in margins.iter_mut().zip(rows) {
            *margin += config.learning_rate * tree.evaluate(row);
        }

        if (round + 1) % 50 == 0 {
            debug!(round = round + 1, nodes = tree.nodes.len(), "boosting progress");
        }
        trees.push(tree);
    }

    info!(rounds = trees.len(), base_score, "gradient boosting trained");
    let model = GradientBoostedTrees::new(width, base_score, config.learning_rate, trees);
    model.validate()?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::Classifier;

    #[test]
    fn test_learns_separable_problem() {
        let rows: Vec<Vec<f64>> = (0..80).map(|i| vec![(i % 10) as f64, (i / 10) as f64]).collect();
        let targets: Vec<u8> = rows.iter().map(|r| u8::from(r[0] >= 5.0)).collect();
        let config = BoostingConfig {
            n_rounds: 60,
            learning_rate: 0.3,
            ..BoostingConfig::default()
        };

        let model = fit_boosting(&rows, &targets, &config).unwrap();
        assert_eq!(model.trees().len(), 60);
        assert_eq!(model.predict(&rows).unwrap(), targets);
    }

    #[test]
    fn test_base_score_is_prior_log_odds() {
        let rows = vec![vec![0.0]; 4];
        let targets = vec![1, 0, 0, 0];
        let config = BoostingConfig {
            n_rounds: 0,
            ..BoostingConfig::default()
        };

        let model = fit_boosting(&rows, &targets, &config).unwrap();
        assert!((model.base_score() - (1.0f64 / 3.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_subsample() {
        let config = BoostingConfig {
            subsample: 0.0,
            ..BoostingConfig::default()
        };
        assert!(fit_boosting(&[vec![1.0]], &[1], &config).is_err());
    }
}
