//! Per-city AQI regression
//!
//! Loads a daily multi-city air quality table, forward-fills gaps within each
//! city, derives lag and rolling AQI features, fits a gradient boosted tree
//! regressor and writes the model plus a feature importance chart.

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod training;
pub mod utils;

pub use config::PipelineConfig;
pub use error::{AqiError, Result};
pub use pipeline::{Pipeline, RunSummary};
pub use training::TrainedModel;
