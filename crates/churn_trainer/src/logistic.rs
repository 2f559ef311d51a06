//! Logistic regression fitted by full-batch gradient descent on standardized
//! features

use crate::errors::{Result, TrainerError};
use churn_core::{sigmoid, LogisticRegression};
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, Serialize)]
pub struct LogisticConfig {
    pub max_iter: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the intercept)
    pub l2: f64,
    /// Stop once the largest gradient component drops below this
    pub tolerance: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            learning_rate: 0.5,
            l2: 1e-4,
            tolerance: 1e-6,
        }
    }
}

pub fn fit_logistic(rows: &[Vec<f64>], targets: &[u8], config: &LogisticConfig) -> Result<LogisticRegression> {
    let (means, scales) = standardization(rows)?;
    let n = rows.len() as f64;
    let width = means.len();

    let standardized: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(means.iter().zip(&scales))
                .map(|(x, (m, s))| (x - m) / s)
                .collect()
        })
        .collect();

    let mut weights = vec![0.0; width];
    let mut intercept = 0.0;
    let mut grad_w = vec![0.0; width];

    for iter in 0..config.max_iter {
        grad_w.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_b = 0.0;

        for (row, &y) in standardized.iter().zip(targets) {
            let z = intercept + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
            let err = sigmoid(z) - y as f64;
            grad_b += err;
            for (g, x) in grad_w.iter_mut().zip(row) {
                *g += err * x;
            }
        }

        let mut max_grad = (grad_b / n).abs();
        for (g, w) in grad_w.iter_mut().zip(&weights) {
            *g = *g / n + config.l2 * w;
            max_grad = max_grad.max(g.abs());
        }

        intercept -= config.learning_rate * grad_b / n;
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= config.learning_rate * g;
        }

        if max_grad < config.tolerance {
            debug!(iterations = iter + 1, "logistic regression converged");
            break;
        }
    }

    let model = LogisticRegression::new(weights, intercept, means, scales);
    model.validate()?;
    Ok(model)
}

/// Per-column mean and population standard deviation; constant columns get
/// scale 1.
fn standardization(rows: &[Vec<f64>]) -> Result<(Vec<f64>, Vec<f64>)> {
    let width = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| TrainerError::Training("no training rows".to_string()))?;
    let n = rows.len() as f64;

    let mut means = vec![0.0; width];
    for row in rows {
        for (m, x) in means.iter_mut().zip(row) {
            *m += x;
        }
    }
    for m in &mut means {
        *m /= n;
    }

    let mut scales = vec![0.0; width];
    for row in rows {
        for ((s, x), m) in scales.iter_mut().zip(row).zip(&means) {
            *s += (x - m) * (x - m) / n;
        }
    }
    for s in &mut scales {
        *s = s.sqrt();
        if !(*s > 1e-12) {
            *s = 1.0;
        }
    }

    Ok((means, scales))
}
