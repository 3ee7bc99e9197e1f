use std::cmp::Ordering;

use crate::error::{AqiError, Result};
use crate::training::trainer::TrainedModel;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Per-feature scores read from a trained model
#[derive(Debug, Clone)]
pub struct ImportanceTable {
    entries: Vec<FeatureImportance>,
}

impl ImportanceTable {
    pub fn from_model(model: &TrainedModel) -> Result<Self> {
        Self::from_scores(&model.feature_names, model.feature_importances())
    }

    pub fn from_scores(names: &[String], scores: &[f64]) -> Result<Self> {
        if scores.is_empty() {
            return Err(AqiError::RenderError("model exposes no feature importances".to_string()));
        }
        if names.len() != scores.len() {
            return Err(AqiError::RenderError(format!(
                "{} feature names for {} importance scores",
                names.len(),
                scores.len()
            )));
        }

        let entries = names
            .iter()
            .zip(scores)
            .map(|(feature, &importance)| FeatureImportance {
                feature: feature.clone(),
                importance: importance.max(0.0),
            })
            .collect();

        Ok(Self { entries })
    }

    /// Highest scores first, ties by name, at most `limit` entries
    pub fn ranked(&self, limit: usize) -> Vec<FeatureImportance> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{:02}", i)).collect()
    }

    #[test]
    fn test_ranked_is_bounded_and_descending() {
        let scores: Vec<f64> = (0..15).map(|i| ((i * 7) % 15) as f64).collect();
        let table = ImportanceTable::from_scores(&names(15), &scores).unwrap();

        let top = table.ranked(10);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].importance >= w[1].importance));
        assert_eq!(top[0].importance, 14.0);
    }

    #[test]
    fn test_fewer_features_than_limit() {
        let table = ImportanceTable::from_scores(&names(3), &[0.2, 0.5, 0.3]).unwrap();
        let top = table.ranked(10);
        let order: Vec<&str> = top.iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(order, vec!["f01", "f02", "f00"]);
    }

    #[test]
    fn test_ties_break_by_name() {
        let table = ImportanceTable::from_scores(&names(3), &[0.0, 0.0, 0.0]).unwrap();
        let order: Vec<String> = table.ranked(10).into_iter().map(|e| e.feature).collect();
        assert_eq!(order, names(3));
    }

    #[test]
    fn test_no_scores_is_render_error() {
        assert!(matches!(
            ImportanceTable::from_scores(&[], &[]),
            Err(AqiError::RenderError(_))
        ));
    }
}
