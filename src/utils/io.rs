use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{AqiError, Result};
use crate::training::trainer::TrainedModel;

fn persist_err(path: &Path, err: impl std::fmt::Display) -> AqiError {
    AqiError::PersistenceError(format!("{}: {}", path.display(), err))
}

/// Serialize the model and swap it into place.
///
/// The bytes go to a temporary file in the target directory, which is then
/// renamed over `path`, so readers never observe a partial artifact.
pub fn save_model<P: AsRef<Path>>(path: P, model: &TrainedModel) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| persist_err(dir, e))?;

    let model_data = bincode::serialize(model).map_err(|e| persist_err(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| persist_err(dir, e))?;
    tmp.write_all(&model_data).map_err(|e| persist_err(path, e))?;
    tmp.as_file().sync_all().map_err(|e| persist_err(path, e))?;
    tmp.persist(path).map_err(|e| persist_err(path, e.error))?;

    info!(path = %path.display(), bytes = model_data.len(), "Model saved");
    Ok(())
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
    let path = path.as_ref();
    let model_data = fs::read(path).map_err(|e| persist_err(path, e))?;
    bincode::deserialize(&model_data).map_err(|e| persist_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::{FeatureRow, FeatureTable};
    use crate::data::observation::Reading;
    use crate::model::GradientBoostingConfig;
    use crate::training::trainer::train_model;
    use chrono::NaiveDate;

    fn fitted_model() -> TrainedModel {
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let table = FeatureTable {
            feature_names: vec!["NO2".to_string()],
            rows: (0..12)
                .map(|i| FeatureRow {
                    city: "Chennai".to_string(),
                    date,
                    features: vec![Reading::Numeric(i as f64)],
                    aqi: Reading::Numeric((i * i) as f64),
                    aqi_bucket: Some("Satisfactory".to_string()),
                })
                .collect(),
        };
        let config = GradientBoostingConfig { n_estimators: 5, max_depth: 2, ..Default::default() };
        train_model(&table, &config).unwrap().model
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        let model = fitted_model();

        save_model(&path, &model).unwrap();
        let loaded = load_model(&path).unwrap();

        assert_eq!(loaded.feature_names, model.feature_names);
        assert_eq!(loaded.predict_row(&[3.0]).unwrap(), model.predict_row(&[3.0]).unwrap());
    }

    #[test]
    fn test_save_overwrites_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"stale").unwrap();

        save_model(&path, &fitted_model()).unwrap();
        assert!(load_model(&path).is_ok());

        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temporary file should be renamed away");
    }

    #[test]
    fn test_unwritable_location_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"file").unwrap();

        let result = save_model(blocker.join("model.bin"), &fitted_model());
        assert!(matches!(result, Err(AqiError::PersistenceError(_))));
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"x").unwrap();
        assert!(matches!(load_model(&path), Err(AqiError::PersistenceError(_))));
    }
}
