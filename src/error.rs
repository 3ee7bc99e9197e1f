//! Error types for the AQI training pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AqiError>;

/// One variant per pipeline stage that can fail
#[derive(Error, Debug)]
pub enum AqiError {
    #[error("Parse error while loading dataset: {0}")]
    ParseError(String),

    #[error("IO error while loading dataset: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Prediction error: {0}")]
    PredictionError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

impl From<csv::Error> for AqiError {
    fn from(err: csv::Error) -> Self {
        AqiError::ParseError(err.to_string())
    }
}
