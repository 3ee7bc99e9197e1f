//! Regression tree used as the boosting base learner

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AqiError, Result};

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Squared-error regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    n_features: usize,
    /// Unnormalized split gain summed per feature
    split_gains: Vec<f64>,
}

impl Default for RegressionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_leaf: 1,
            n_features: 0,
            split_gains: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(AqiError::TrainingError(format!(
                "feature rows ({}) and targets ({}) differ",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(AqiError::TrainingError("cannot fit a tree on zero rows".to_string()));
        }

        self.n_features = x.ncols();
        let mut gains = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut gains));
        self.split_gains = gains;

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        gains: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let value = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;

        let should_stop = n_samples < 2
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_constant(y, indices);

        if should_stop {
            return TreeNode::Leaf { value };
        }

        let Some(best) = self.find_best_split(x, y, indices) else {
            return TreeNode::Leaf { value };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        gains[best.feature_idx] += best.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, gains));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, gains));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
        }
    }

    /// Best split over all features. Features are scanned in parallel and
    /// reduced in index order; ties keep the lower feature index.
    fn find_best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<SplitCandidate> {
        (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| self.best_split_for_feature(x, y, indices, feature_idx))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }

    // Sorted sweep with running sums: SSE reduction is
    // sum_l^2/n_l + sum_r^2/n_r - sum^2/n
    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
    ) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let parent_score = total_sum * total_sum / n as f64;

        let mut best: Option<SplitCandidate> = None;
        let mut left_sum = 0.0;

        for k in 0..n - 1 {
            left_sum += pairs[k].1;
            let (lo, hi) = (pairs[k].0, pairs[k + 1].0);
            if lo == hi {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let gain = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64
                - parent_score;

            if gain > best.map_or(1e-12, |b| b.gain) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate { feature_idx, threshold, gain });
            }
        }

        best
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| AqiError::PredictionError("tree has not been fitted".to_string()))?;
        Ok(x.rows().into_iter().map(|row| predict_sample(root, row)).collect())
    }

    /// Summed split gain per feature
    pub fn split_gains(&self) -> &[f64] {
        &self.split_gains
    }

    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }
}

fn is_constant(y: &Array1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| (y[i] - first).abs() < 1e-10)
}

fn predict_sample(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split { feature_idx, threshold, left, right, .. } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}
