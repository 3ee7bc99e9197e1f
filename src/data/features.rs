//! Temporal feature construction
//!
//! Every derived value for position `i` of a city series is computed from
//! positions `..=i` of that same series. Rows without a full rolling window
//! are excluded.

use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::data::observation::{CitySeries, Reading};

pub const ROLLING_WINDOW: usize = 7;

pub const TEMPORAL_FEATURES: [&str; 5] =
    ["AQI_lag1", "AQI_lag2", "AQI_rolling_mean_7", "Month", "DayOfYear"];

/// Derived fields for one observation
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalFeatures {
    pub aqi_lag1: Reading,
    pub aqi_lag2: Reading,
    pub aqi_rolling_mean_7: Reading,
    pub month: u32,
    pub day_of_year: u32,
}

impl TemporalFeatures {
    fn into_readings(self) -> [Reading; 5] {
        [
            self.aqi_lag1,
            self.aqi_lag2,
            self.aqi_rolling_mean_7,
            Reading::Numeric(self.month as f64),
            Reading::Numeric(self.day_of_year as f64),
        ]
    }
}

/// One training row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub city: String,
    pub date: NaiveDate,
    /// Pollutants in column order, then `TEMPORAL_FEATURES`
    pub features: Vec<Reading>,
    pub aqi: Reading,
    pub aqi_bucket: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub feature_names: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Features for position `i`, or `None` without a full window behind it
pub fn temporal_features(series: &CitySeries, i: usize) -> Option<TemporalFeatures> {
    if i >= series.len() || i + 1 < ROLLING_WINDOW {
        return None;
    }
    let obs = &series.observations;
    let window = &obs[i + 1 - ROLLING_WINDOW..=i];

    Some(TemporalFeatures {
        aqi_lag1: obs[i - 1].aqi.clone(),
        aqi_lag2: obs[i - 2].aqi.clone(),
        aqi_rolling_mean_7: window_mean(window.iter().map(|o| &o.aqi))?,
        month: obs[i].date.month(),
        day_of_year: obs[i].date.ordinal(),
    })
}

// A non-numeric value poisons the mean so it surfaces at training time
fn window_mean<'a>(values: impl Iterator<Item = &'a Reading>) -> Option<Reading> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        match value {
            Reading::Numeric(v) => {
                sum += v;
                count += 1;
            }
            Reading::Missing => return None,
            Reading::Invalid(raw) => return Some(Reading::Invalid(raw.clone())),
        }
    }
    Some(Reading::Numeric(sum / count as f64))
}

/// Build the training table from imputed city series
pub fn build_feature_table(pollutants: &[String], series: &[CitySeries]) -> FeatureTable {
    let feature_names = pollutants
        .iter()
        .cloned()
        .chain(TEMPORAL_FEATURES.iter().map(|s| s.to_string()))
        .collect();

    let mut rows = Vec::new();
    for city in series {
        for (i, obs) in city.observations.iter().enumerate() {
            let Some(derived) = temporal_features(city, i) else {
                continue;
            };
            let mut features = obs.measurements.clone();
            features.extend(derived.into_readings());
            rows.push(FeatureRow {
                city: obs.city.clone(),
                date: obs.date,
                features,
                aqi: obs.aqi.clone(),
                aqi_bucket: obs.aqi_bucket.clone(),
            });
        }
    }

    info!(rows = rows.len(), cities = series.len(), "Temporal features built");

    FeatureTable { feature_names, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::observation::Observation;

    fn series(city: &str, aqi: &[f64]) -> CitySeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        CitySeries {
            city: city.to_string(),
            observations: aqi
                .iter()
                .enumerate()
                .map(|(i, &v)| Observation {
                    city: city.to_string(),
                    date: start + chrono::Duration::days(i as i64),
                    measurements: vec![Reading::Numeric(v / 2.0)],
                    aqi: Reading::Numeric(v),
                    aqi_bucket: Some("Moderate".to_string()),
                })
                .collect(),
        }
    }

    fn pollutants() -> Vec<String> {
        vec!["PM10".to_string()]
    }

    #[test]
    fn test_rolling_mean_exact() {
        let s = series("Delhi", &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);
        let f = temporal_features(&s, 6).unwrap();
        assert_eq!(f.aqi_rolling_mean_7, Reading::Numeric(40.0));
        assert_eq!(f.aqi_lag1, Reading::Numeric(60.0));
        assert_eq!(f.aqi_lag2, Reading::Numeric(50.0));
        assert_eq!(f.month, 1);
        assert_eq!(f.day_of_year, 7);
    }

    #[test]
    fn test_history_gating() {
        let six = series("Delhi", &[1.0; 6]);
        assert!(build_feature_table(&pollutants(), &[six]).is_empty());

        let seven = series("Delhi", &[1.0; 7]);
        assert_eq!(build_feature_table(&pollutants(), &[seven]).len(), 1);
    }

    #[test]
    fn test_no_partial_windows() {
        let s = series("Delhi", &[1.0; 10]);
        for i in 0..6 {
            assert!(temporal_features(&s, i).is_none(), "position {}", i);
        }
        assert!(temporal_features(&s, 6).is_some());
        assert!(temporal_features(&s, 10).is_none());
    }

    #[test]
    fn test_feature_layout() {
        let s = series("Delhi", &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);
        let table = build_feature_table(&pollutants(), &[s]);
        assert_eq!(
            table.feature_names,
            vec!["PM10", "AQI_lag1", "AQI_lag2", "AQI_rolling_mean_7", "Month", "DayOfYear"]
        );
        let row = &table.rows[0];
        assert_eq!(
            row.features,
            vec![
                Reading::Numeric(35.0),
                Reading::Numeric(60.0),
                Reading::Numeric(50.0),
                Reading::Numeric(40.0),
                Reading::Numeric(1.0),
                Reading::Numeric(7.0),
            ]
        );
        assert_eq!(row.aqi, Reading::Numeric(70.0));
    }

    #[test]
    fn test_no_look_ahead() {
        let base: Vec<f64> = (1..=12).map(|v| v as f64 * 10.0).collect();
        let original = series("Delhi", &base);

        let mut mutated = base.clone();
        mutated[9] = 999.0;
        mutated[11] = -5.0;
        let changed = series("Delhi", &mutated);

        for i in 0..9 {
            assert_eq!(
                temporal_features(&original, i),
                temporal_features(&changed, i),
                "position {} saw a later value",
                i
            );
        }
    }

    #[test]
    fn test_no_cross_city_leakage() {
        let a = series("Agra", &[5.0; 9]);
        let b = series("Bhopal", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let a_changed = series("Agra", &[500.0; 9]);

        let before = build_feature_table(&pollutants(), &[a, b.clone()]);
        let after = build_feature_table(&pollutants(), &[a_changed, b]);

        let bhopal = |t: &FeatureTable| -> Vec<FeatureRow> {
            t.rows.iter().filter(|r| r.city == "Bhopal").cloned().collect()
        };
        assert_eq!(bhopal(&before).len(), 2);
        assert_eq!(bhopal(&before), bhopal(&after));
    }

    #[test]
    fn test_invalid_aqi_propagates() {
        let mut s = series("Delhi", &[1.0; 7]);
        s.observations[3].aqi = Reading::Invalid("bad".to_string());
        let f = temporal_features(&s, 6).unwrap();
        assert_eq!(f.aqi_rolling_mean_7, Reading::Invalid("bad".to_string()));
    }
}
