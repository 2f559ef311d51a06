//! Binary decision tree structures shared by the forest and boosting models

use crate::errors::{ChurnError, Result};
use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes carry `feature_idx >= 0` and child indices; leaves carry
/// `feature_idx == -1` and a `leaf` value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: i32,
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    pub threshold: f64,
    pub leaf: Option<f64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A decision tree; node 0 is the root
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk the tree for one row: left when `value <= threshold`.
    ///
    /// Malformed structure evaluates to 0.0; [`Tree::validate`] rejects it at
    /// load time.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let Some(value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };
            let next = if *value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next <= idx as i32 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    /// Longest root-to-leaf path. Children that do not point forward end
    /// the walk, as in [`Tree::evaluate`].
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    let child = |next: i32| {
                        if next > idx as i32 {
                            walk(nodes, next as usize)
                        } else {
                            0
                        }
                    };
                    1 + child(node.left).max(child(node.right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Check structure against the expected input width.
    ///
    /// Children must point forward in the node list, which also rules out
    /// cycles.
    pub fn validate(&self, feature_count: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ChurnError::InvalidSchema("tree has no nodes".to_string()));
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            let i = i as i32;
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    _ => {
                        return Err(ChurnError::InvalidSchema(format!(
                            "leaf node {i} has no finite value"
                        )))
                    }
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i || child >= len {
                    return Err(ChurnError::InvalidSchema(format!(
                        "node {i} has invalid {side} child {child}"
                    )));
                }
            }
            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(ChurnError::InvalidSchema(format!(
                    "node {i} splits on feature {} outside 0..{feature_count}",
                    node.feature_idx
                )));
            }
            if !node.threshold.is_finite() {
                return Err(ChurnError::InvalidSchema(format!(
                    "node {i} has non-finite threshold"
                )));
            }
        }

        Ok(())
    }
}
