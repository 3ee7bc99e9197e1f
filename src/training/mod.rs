pub mod history;
pub mod importance;
pub mod trainer;

pub use history::TrainingHistory;
pub use importance::{FeatureImportance, ImportanceTable};
pub use trainer::{train_model, TrainedModel, TrainingOutcome};
