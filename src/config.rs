use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::gradient_boosting::GradientBoostingConfig;

/// Paths and hyperparameters for one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source table (CSV)
    pub data_path: PathBuf,
    /// Directory holding the model artifact, created if absent
    pub model_dir: PathBuf,
    /// Artifact file name inside `model_dir`
    pub model_file: String,
    /// Feature importance chart (PNG)
    pub chart_path: PathBuf,
    /// Number of features shown in the importance chart
    pub top_features: usize,
    pub boosting: GradientBoostingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/city_day.csv"),
            model_dir: PathBuf::from("saved_model"),
            model_file: "aqi_model.bin".to_string(),
            chart_path: PathBuf::from("feature_importance.png"),
            top_features: 10,
            boosting: GradientBoostingConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = PipelineConfig::default();
        assert_eq!(config.model_path(), PathBuf::from("saved_model/aqi_model.bin"));
        assert_eq!(config.top_features, 10);
        assert_eq!(config.boosting.n_estimators, 200);
        assert_eq!(config.boosting.random_state, Some(42));
    }
}
