use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::features::{FeatureRow, FeatureTable};
use crate::data::observation::Reading;
use crate::error::{AqiError, Result};
use crate::model::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use crate::training::history::TrainingHistory;

/// Fitted AQI regressor with the feature layout it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub feature_names: Vec<String>,
    regressor: GradientBoostingRegressor,
}

impl TrainedModel {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.feature_names.len() {
            return Err(AqiError::PredictionError(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                x.ncols()
            )));
        }
        self.regressor.predict(x)
    }

    pub fn predict_row(&self, features: &[f64]) -> Result<f64> {
        let x = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| AqiError::PredictionError(e.to_string()))?;
        Ok(self.predict(&x)?[0])
    }

    /// Normalized importance per feature, aligned with `feature_names`
    pub fn feature_importances(&self) -> &[f64] {
        self.regressor.feature_importances()
    }
}

pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub history: TrainingHistory,
}

/// Turn the feature table into a numeric design matrix and target vector
pub fn to_matrix(table: &FeatureTable) -> Result<(Array2<f64>, Array1<f64>)> {
    if table.is_empty() {
        return Err(AqiError::TrainingError("feature table is empty".to_string()));
    }

    let n_features = table.feature_names.len();
    let mut values = Vec::with_capacity(table.len() * n_features);
    let mut targets = Vec::with_capacity(table.len());

    for row in &table.rows {
        if row.features.len() != n_features {
            return Err(AqiError::TrainingError(format!(
                "{} {}: expected {} features, got {}",
                row.city,
                row.date,
                n_features,
                row.features.len()
            )));
        }
        for (name, reading) in table.feature_names.iter().zip(&row.features) {
            values.push(numeric(reading, name, row)?);
        }
        targets.push(numeric(&row.aqi, "AQI", row)?);
    }

    let x = Array2::from_shape_vec((table.len(), n_features), values)
        .map_err(|e| AqiError::TrainingError(e.to_string()))?;
    Ok((x, Array1::from_vec(targets)))
}

fn numeric(reading: &Reading, column: &str, row: &FeatureRow) -> Result<f64> {
    match reading {
        Reading::Numeric(v) if v.is_finite() => Ok(*v),
        Reading::Numeric(v) => Err(AqiError::TrainingError(format!(
            "non-finite value {} in column '{}' ({} {})",
            v, column, row.city, row.date
        ))),
        Reading::Invalid(raw) => Err(AqiError::TrainingError(format!(
            "non-numeric value '{}' in column '{}' ({} {})",
            raw, column, row.city, row.date
        ))),
        Reading::Missing => Err(AqiError::TrainingError(format!(
            "missing value in column '{}' ({} {})",
            column, row.city, row.date
        ))),
    }
}

/// Fit the gradient boosting regressor on the full feature table
pub fn train_model(table: &FeatureTable, config: &GradientBoostingConfig) -> Result<TrainingOutcome> {
    let (x, y) = to_matrix(table)?;

    info!(
        rows = x.nrows(),
        features = x.ncols(),
        n_estimators = config.n_estimators,
        learning_rate = config.learning_rate,
        max_depth = config.max_depth,
        "Starting training"
    );

    let mut regressor = GradientBoostingRegressor::new(config.clone());
    let history = regressor.fit(&x, &y)?;

    Ok(TrainingOutcome {
        model: TrainedModel {
            feature_names: table.feature_names.clone(),
            regressor,
        },
        history,
    })
}
