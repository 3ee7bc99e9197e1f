//! Stage-by-stage training run
//!
//! Each stage takes the previous stage's output by value or reference and
//! returns its own; nothing is shared between stages except the config.

use std::path::PathBuf;

use tracing::info;

use crate::config::PipelineConfig;
use crate::data::features::{build_feature_table, FeatureTable};
use crate::data::imputer::impute;
use crate::data::loader::load_dataset;
use crate::data::observation::{CitySeries, Dataset, Observation};
use crate::error::Result;
use crate::training::importance::ImportanceTable;
use crate::training::trainer::{train_model, TrainingOutcome};
use crate::utils::{io, plot};

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub loaded_rows: usize,
    pub cleaned_rows: usize,
    pub cities: usize,
    pub feature_rows: usize,
    pub final_rmse: Option<f64>,
    pub model_path: PathBuf,
    pub chart_path: PathBuf,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn load(&self) -> Result<Dataset> {
        load_dataset(&self.config.data_path)
    }

    pub fn clean(&self, observations: Vec<Observation>) -> Vec<CitySeries> {
        let series = impute(observations);
        let rows: usize = series.iter().map(CitySeries::len).sum();
        info!(rows, cities = series.len(), "Data loaded and cleaned");
        series
    }

    pub fn engineer(&self, pollutants: &[String], series: &[CitySeries]) -> FeatureTable {
        info!("Engineering temporal features");
        build_feature_table(pollutants, series)
    }

    pub fn train(&self, table: &FeatureTable) -> Result<TrainingOutcome> {
        let outcome = train_model(table, &self.config.boosting)?;
        info!(rmse = ?outcome.history.final_loss(), "Model training complete");
        Ok(outcome)
    }

    pub fn persist(&self, outcome: &TrainingOutcome) -> Result<PathBuf> {
        let path = self.config.model_path();
        info!(path = %path.display(), "Saving model");
        io::save_model(&path, &outcome.model)?;
        Ok(path)
    }

    pub fn report(&self, outcome: &TrainingOutcome) -> Result<PathBuf> {
        let table = ImportanceTable::from_model(&outcome.model)?;
        let top = table.ranked(self.config.top_features);
        for entry in &top {
            info!(feature = %entry.feature, importance = entry.importance, "Feature importance");
        }
        plot::render_importance_chart(&top, &self.config.chart_path)?;
        Ok(self.config.chart_path.clone())
    }

    /// Load, clean, engineer, train, then persist and report
    pub fn run(&self) -> Result<RunSummary> {
        info!("Starting model training run");

        let Dataset { pollutants, observations } = self.load()?;
        let loaded_rows = observations.len();

        let series = self.clean(observations);
        let cleaned_rows = series.iter().map(CitySeries::len).sum();

        let table = self.engineer(&pollutants, &series);
        let outcome = self.train(&table)?;

        let model_path = self.persist(&outcome)?;
        let chart_path = self.report(&outcome)?;

        Ok(RunSummary {
            loaded_rows,
            cleaned_rows,
            cities: series.len(),
            feature_rows: table.len(),
            final_rmse: outcome.history.final_loss(),
            model_path,
            chart_path,
        })
    }
}
