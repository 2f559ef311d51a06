//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy construction over per-sample gradients and hessians:
//! - gain = G_L²/(H_L+λ) + G_R²/(H_R+λ) - G²/(H+λ)
//! - leaf = -G/(H+λ)
//!
//! With `g = -y`, `h = 1` and `λ = 0` the leaves are class-1 fractions and the
//! gain is the Gini decrease, which is how the random forest uses it. The
//! boosting trainer feeds logistic-loss gradients instead.

use churn_core::model::{Node, Tree};
use rand::rngs::StdRng;
use rand::seq::index;
use std::cmp::Ordering;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Minimum hessian sum per child
    pub min_child_weight: f64,
    /// L2 regularization on leaf values
    pub lambda: f64,
    /// Features considered per node; `None` uses all of them
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 1,
            min_child_weight: 0.0,
            lambda: 0.0,
            max_features: None,
        }
    }
}

/// Split candidate; ties go to the lower `(feature_idx, threshold)`
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        match self.gain.total_cmp(&other.gain) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match self.feature_idx.cmp(&other.feature_idx) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => self.threshold.total_cmp(&other.threshold).is_lt(),
            },
        }
    }
}

pub struct CartBuilder<'a> {
    features: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    feature_count: usize,
    config: TreeConfig,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        let feature_count = features.first().map_or(0, Vec::len);
        Self {
            features,
            gradients,
            hessians,
            feature_count,
            config,
        }
    }

    /// Build a tree over the samples at `indices` (duplicates allowed)
    pub fn build(&self, indices: &[usize], rng: &mut StdRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>, rng: &mut StdRng) -> i32 {
        let current = nodes.len() as i32;
        let (sum_g, sum_h) = self.sums(indices);
        let leaf_value = self.leaf_value(sum_g, sum_h);

        let split = if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf.max(1)
        {
            None
        } else {
            self.find_best_split(indices, sum_g, sum_h, rng)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current, leaf_value));
            return current;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][split.feature_idx] <= split.threshold);

        nodes.push(Node::internal(current, split.feature_idx as i32, split.threshold, -1, -1));
        let left_idx = self.build_node(&left, depth + 1, nodes, rng);
        let right_idx = self.build_node(&right, depth + 1, nodes, rng);
        nodes[current as usize].left = left_idx;
        nodes[current as usize].right = right_idx;

        current
    }

    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        match self.config.max_features {
            Some(k) if k > 0 && k < self.feature_count => {
                let mut chosen = index::sample(rng, self.feature_count, k).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..self.feature_count).collect(),
        }
    }

    /// Sorted scan over each candidate feature
    fn find_best_split(
        &self,
        indices: &[usize],
        sum_g: f64,
        sum_h: f64,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let lambda = self.config.lambda;
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = score(sum_g, sum_h, lambda);
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in self.candidate_features(rng) {
            sorted.sort_by(|&a, &b| self.features[a][feature_idx].total_cmp(&self.features[b][feature_idx]));

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                g_left += self.gradients[i];
                h_left += self.hessians[i];

                let value = self.features[i][feature_idx];
                let next = self.features[sorted[pos + 1]][feature_idx];
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                    continue;
                }
                let h_right = sum_h - h_left;
                if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                    continue;
                }

                let gain = score(g_left, h_left, lambda) + score(sum_g - g_left, h_right, lambda)
                    - parent_score;
                if !(gain > 1e-12) {
                    continue;
                }

                let candidate = SplitCandidate {
                    feature_idx,
                    threshold: midpoint(value, next),
                    gain,
                };
                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(g, h), &i| {
            (g + self.gradients[i], h + self.hessians[i])
        })
    }

    fn leaf_value(&self, sum_g: f64, sum_h: f64) -> f64 {
        let denom = sum_h + self.config.lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        -sum_g / denom
    }
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    let denom = h + lambda;
    if denom <= 0.0 {
        0.0
    } else {
        g * g / denom
    }
}

// Threshold strictly below `next` so that `next` goes right.
fn midpoint(value: f64, next: f64) -> f64 {
    let mid = value + (next - value) / 2.0;
    if mid < next {
        mid
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_gini_tree_separates_classes() {
        let features = vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0], vec![4.0, 5.0]];
        let labels = [0.0, 0.0, 1.0, 1.0];
        let gradients: Vec<f64> = labels.iter().map(|y| -y).collect();
        let hessians = vec![1.0; 4];

        let builder = CartBuilder::new(&features, &gradients, &hessians, TreeConfig::default());
        let tree = builder.build(&[0, 1, 2, 3], &mut rng());

        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert_eq!(tree.nodes[0].threshold, 2.5);
        assert_eq!(tree.evaluate(&[1.5, 5.0]), 0.0);
        assert_eq!(tree.evaluate(&[3.5, 5.0]), 1.0);
        assert!(tree.validate(2).is_ok());
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let features = vec![vec![1.0], vec![2.0]];
        let gradients = vec![-1.0, -1.0];
        let hessians = vec![1.0, 1.0];

        let tree = CartBuilder::new(&features, &gradients, &hessians, TreeConfig::default())
            .build(&[0, 1], &mut rng());
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(1.0));
    }

    #[test]
    fn test_lambda_shrinks_leaves() {
        let features = vec![vec![0.0]];
        let gradients = vec![-1.0];
        let hessians = vec![1.0];
        let config = TreeConfig {
            lambda: 1.0,
            ..TreeConfig::default()
        };

        let tree = CartBuilder::new(&features, &gradients, &hessians, config).build(&[0], &mut rng());
        assert_eq!(tree.nodes[0].leaf, Some(0.5));
    }

    #[test]
    fn test_tie_prefers_lower_feature() {
        // Both features separate the classes identically.
        let features = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let gradients = vec![0.0, -1.0];
        let hessians = vec![1.0, 1.0];

        let tree = CartBuilder::new(&features, &gradients, &hessians, TreeConfig::default())
            .build(&[0, 1], &mut rng());
        assert_eq!(tree.nodes[0].feature_idx, 0);
    }

    #[test]
    fn test_depth_limit() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let gradients: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 0.0 } else { -1.0 }).collect();
        let hessians = vec![1.0; 16];
        let config = TreeConfig {
            max_depth: 2,
            ..TreeConfig::default()
        };
        let indices: Vec<usize> = (0..16).collect();

        let tree = CartBuilder::new(&features, &gradients, &hessians, config).build(&indices, &mut rng());
        assert!(tree.depth() <= 2);
    }
}
