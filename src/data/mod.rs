pub mod features;
pub mod imputer;
pub mod loader;
pub mod observation;

pub use features::{build_feature_table, FeatureRow, FeatureTable, TemporalFeatures};
pub use imputer::impute;
pub use loader::{load_dataset, read_dataset};
pub use observation::{CitySeries, Dataset, Observation, Reading};
