//! Gradient boosting regressor
//!
//! Squared-error boosting over `RegressionTree` base learners. Row and column
//! sampling draws from a seeded Xoshiro generator, so a fixed `random_state`
//! and identical input give identical trees.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::decision_tree::RegressionTree;
use crate::error::{AqiError, Result};
use crate::training::history::TrainingHistory;

const PROGRESS_EVERY: usize = 50;

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio for each tree
    pub subsample: f64,
    /// Column subsample ratio for each tree
    pub colsample_bytree: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.08,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: Some(42),
        }
    }
}

impl GradientBoostingConfig {
    fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if self.n_estimators == 0 {
            return Err(AqiError::TrainingError("n_estimators must be positive".to_string()));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(AqiError::TrainingError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !in_unit(self.subsample) || !in_unit(self.colsample_bytree) {
            return Err(AqiError::TrainingError(format!(
                "subsample ratios must lie in (0, 1], got {} / {}",
                self.subsample, self.colsample_bytree
            )));
        }
        Ok(())
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<RegressionTree>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
    feature_importances: Vec<f64>,
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_prediction: 0.0,
            feature_importances: Vec::new(),
        }
    }

    /// Fit on the whole table; returns per-round training RMSE
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainingHistory> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(AqiError::TrainingError("no training rows".to_string()));
        }
        if n_samples != y.len() {
            return Err(AqiError::TrainingError(format!(
                "feature rows ({}) and targets ({}) differ",
                n_samples,
                y.len()
            )));
        }

        self.trees.clear();
        self.col_indices_per_tree.clear();
        self.initial_prediction = y.mean().unwrap_or(0.0);

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut gains = vec![0.0; n_features];
        let mut history = TrainingHistory::default();

        for round in 0..self.config.n_estimators {
            let residuals = y - &predictions;

            let sample_indices = draw_indices(n_samples, self.config.subsample, &mut rng);
            let col_indices = draw_indices(n_features, self.config.colsample_bytree, &mut rng);

            let x_cols = x.select(Axis(1), &col_indices);
            let x_sub = x_cols.select(Axis(0), &sample_indices);
            let y_sub = residuals.select(Axis(0), &sample_indices);

            let mut tree = RegressionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit(&x_sub, &y_sub)?;

            // Every row moves, sampled or not
            let tree_pred = tree.predict(&x_cols)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);

            for (&col_idx, &gain) in col_indices.iter().zip(tree.split_gains()) {
                gains[col_idx] += gain;
            }

            let loss = rmse(y, &predictions);
            history.record(round, loss);
            debug!(round, rmse = loss, leaves = tree.get_n_leaves(), "Boosting round complete");
            if reports_progress(round, self.config.n_estimators) {
                info!("Round {}/{} - rmse: {:.4}", round + 1, self.config.n_estimators, loss);
            }

            self.trees.push(tree);
            self.col_indices_per_tree.push(col_indices);
        }

        let total: f64 = gains.iter().sum();
        if total > 0.0 {
            for gain in &mut gains {
                *gain /= total;
            }
        }
        self.feature_importances = gains;

        Ok(history)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(AqiError::PredictionError("model has not been fitted".to_string()));
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, col_indices) in self.trees.iter().zip(self.col_indices_per_tree.iter()) {
            let x_sub = x.select(Axis(1), col_indices);
            let tree_pred = tree.predict(&x_sub)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);
        }

        Ok(predictions)
    }

    /// Normalized total split gain per feature; empty before fitting
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

/// Every `PROGRESS_EVERY` rounds plus the final one
fn reports_progress(round: usize, n_estimators: usize) -> bool {
    round % PROGRESS_EVERY == 0 || round + 1 == n_estimators
}

fn draw_indices(n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let sample_size = ((n as f64) * ratio).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(sample_size.min(n));
    indices.sort_unstable();
    indices
}

pub fn rmse(y: &Array1<f64>, predictions: &Array1<f64>) -> f64 {
    let mse = y
        .iter()
        .zip(predictions.iter())
        .map(|(yi, pi)| (yi - pi).powi(2))
        .sum::<f64>()
        / y.len().max(1) as f64;
    mse.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| i as f64 * 0.1).collect()).unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| row[0] * 2.0 + row[1] * 0.5 + 1.0)
            .collect();
        (x, y)
    }

    fn small_config() -> GradientBoostingConfig {
        GradientBoostingConfig {
            n_estimators: 20,
            max_depth: 3,
            learning_rate: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_gradient_boosting_regressor() {
        let (x, y) = create_regression_data();
        let mut model = GradientBoostingRegressor::new(small_config());
        let history = model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 100);

        let mse = rmse(&y, &predictions).powi(2);
        let y_var = y.var(0.0);
        assert!(mse < y_var, "MSE ({}) should be less than variance ({})", mse, y_var);

        assert_eq!(history.rounds.len(), 20);
        let first = history.losses[0];
        let last = *history.losses.last().unwrap();
        assert!(last < first, "training loss should fall: {} -> {}", first, last);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (x, y) = create_regression_data();
        let config = GradientBoostingConfig {
            subsample: 0.7,
            colsample_bytree: 0.5,
            ..small_config()
        };

        let mut a = GradientBoostingRegressor::new(config.clone());
        let mut b = GradientBoostingRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_feature_importances() {
        let (x, y) = create_regression_data();
        let mut model = GradientBoostingRegressor::new(small_config());
        model.fit(&x, &y).unwrap();

        let importances = model.feature_importances();
        assert_eq!(importances.len(), 2);
        assert!(importances.iter().all(|&v| v >= 0.0));

        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 0.01, "Sum of importances ({}) should be ~1", sum);
    }

    #[test]
    fn test_empty_input_fails() {
        let mut model = GradientBoostingRegressor::new(small_config());
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<f64>::zeros(0);
        assert!(matches!(model.fit(&x, &y), Err(AqiError::TrainingError(_))));
    }

    #[test]
    fn test_invalid_config_fails() {
        let (x, y) = create_regression_data();
        let config = GradientBoostingConfig { subsample: 0.0, ..small_config() };
        let mut model = GradientBoostingRegressor::new(config);
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = GradientBoostingRegressor::new(small_config());
        assert!(matches!(
            model.predict(&Array2::zeros((1, 2))),
            Err(AqiError::PredictionError(_))
        ));
    }

    #[test]
    fn test_progress_rounds() {
        let logged: Vec<usize> = (0..200).filter(|&r| reports_progress(r, 200)).collect();
        assert_eq!(logged, vec![0, 50, 100, 150, 199]);
        assert!(reports_progress(0, 1));
    }
}
