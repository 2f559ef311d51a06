//! Random forest: bootstrap samples, √F features per node, Gini splits

use crate::cart::{CartBuilder, TreeConfig};
use crate::errors::{Result, TrainerError};
use churn_core::{accuracy, RandomForest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Features per node; `None` uses ⌈√F⌉
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 16,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Fit a forest and report its out-of-bag accuracy when any sample was left
/// out of every bootstrap.
pub fn fit_forest(rows: &[Vec<f64>], targets: &[u8], config: &ForestConfig) -> Result<(RandomForest, Option<f64>)> {
    let n = rows.len();
    let width = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| TrainerError::Training("no training rows".to_string()))?;
    if config.n_trees == 0 {
        return Err(TrainerError::Training("forest needs at least one tree".to_string()));
    }

    let gradients: Vec<f64> = targets.iter().map(|&y| -(y as f64)).collect();
    let hessians = vec![1.0; n];
    let tree_config = TreeConfig {
        max_depth: config.max_depth,
        min_samples_leaf: config.min_samples_leaf,
        min_child_weight: 0.0,
        lambda: 0.0,
        max_features: Some(config.max_features.unwrap_or_else(|| sqrt_features(width))),
    };
    let builder = CartBuilder::new(rows, &gradients, &hessians, tree_config);

    let mut trees = Vec::with_capacity(config.n_trees);
    let mut oob_sum = vec![0.0; n];
    let mut oob_votes = vec![0usize; n];

    for tree_idx in 0..config.n_trees {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));
        let mut in_bag = vec![false; n];
        let sample: Vec<usize> = (0..n)
            .map(|_| {
                let i = rng.gen_range(0..n);
                in_bag[i] = true;
                i
            })
            .collect();

        let tree = builder.build(&sample, &mut rng);
        for (i, row) in rows.iter().enumerate().filter(|(i, _)| !in_bag[*i]) {
            oob_sum[i] += tree.evaluate(row);
            oob_votes[i] += 1;
        }

        debug!(tree = tree_idx + 1, nodes = tree.nodes.len(), "fitted forest tree");
        trees.push(tree);
    }

    let (predicted, labels): (Vec<u8>, Vec<u8>) = (0..n)
        .filter(|&i| oob_votes[i] > 0)
        .map(|i| (u8::from(oob_sum[i] / oob_votes[i] as f64 >= 0.5), targets[i]))
        .unzip();
    let oob = (!labels.is_empty()).then(|| accuracy(&predicted, &labels));

    info!(trees = trees.len(), oob_accuracy = ?oob, "random forest trained");
    Ok((RandomForest::new(width, trees), oob))
}

fn sqrt_features(width: usize) -> usize {
    ((width as f64).sqrt().ceil() as usize).clamp(1, width.max(1))
}
