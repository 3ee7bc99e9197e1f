//! Per-city forward fill
//!
//! Observations are split into one `CitySeries` per city and sorted by date.
//! Missing cells are then filled from earlier rows of the same series only.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::data::observation::{CitySeries, Observation, Reading};

/// Split observations by city (ascending by name), each sorted by date.
/// Rows sharing a date keep their input order.
pub fn partition_by_city(observations: Vec<Observation>) -> Vec<CitySeries> {
    let mut groups: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        groups.entry(obs.city.clone()).or_default().push(obs);
    }

    groups
        .into_iter()
        .map(|(city, mut rows)| {
            rows.sort_by_key(|o| o.date);
            CitySeries { city, observations: rows }
        })
        .collect()
}

/// Collapse rows sharing a date to the last one.
///
/// Runs after `forward_fill`, so a blank duplicate has already inherited the
/// values of the row before it.
pub fn collapse_duplicate_dates(series: &mut CitySeries) {
    let before = series.len();
    let mut deduped: Vec<Observation> = Vec::with_capacity(before);
    for obs in series.observations.drain(..) {
        match deduped.last_mut() {
            Some(last) if last.date == obs.date => *last = obs,
            _ => deduped.push(obs),
        }
    }
    series.observations = deduped;

    if series.len() < before {
        warn!(
            city = %series.city,
            duplicates = before - series.len(),
            "Collapsed duplicate dates, keeping the last row"
        );
    }
}

/// Replace missing cells with the latest earlier value in the same series
pub fn forward_fill(series: &mut CitySeries) {
    let n_measurements = series
        .observations
        .first()
        .map_or(0, |o| o.measurements.len());

    let mut last_measurements: Vec<Option<Reading>> = vec![None; n_measurements];
    let mut last_aqi: Option<Reading> = None;
    let mut last_bucket: Option<String> = None;

    for obs in &mut series.observations {
        for (cell, last) in obs.measurements.iter_mut().zip(last_measurements.iter_mut()) {
            fill_reading(cell, last);
        }
        fill_reading(&mut obs.aqi, &mut last_aqi);

        if obs.aqi_bucket.is_none() {
            obs.aqi_bucket = last_bucket.clone();
        } else {
            last_bucket = obs.aqi_bucket.clone();
        }
    }
}

fn fill_reading(cell: &mut Reading, last: &mut Option<Reading>) {
    if cell.is_missing() {
        if let Some(prev) = last {
            *cell = prev.clone();
        }
    } else {
        *last = Some(cell.clone());
    }
}

/// Remove rows that still have a missing field after filling
pub fn drop_incomplete(series: &mut CitySeries) {
    let before = series.len();
    series.observations.retain(Observation::is_complete);
    let dropped = before - series.len();
    if dropped > 0 {
        debug!(city = %series.city, dropped, "Dropped incomplete rows");
    }
}

/// Partition, fill, collapse duplicate dates and drop incomplete rows.
/// Cities left with no rows are omitted.
pub fn impute(observations: Vec<Observation>) -> Vec<CitySeries> {
    partition_by_city(observations)
        .into_iter()
        .filter_map(|mut series| {
            forward_fill(&mut series);
            collapse_duplicate_dates(&mut series);
            drop_incomplete(&mut series);
            if series.is_empty() { None } else { Some(series) }
        })
        .collect()
}
