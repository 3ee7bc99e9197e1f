use chrono::NaiveDate;

/// A single measurement cell
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Empty cell
    Missing,
    Numeric(f64),
    /// Present but not a number; rejected at training time
    Invalid(String),
}

impl Reading {
    /// Parse a raw CSV cell
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return Reading::Missing;
        }
        match raw.parse::<f64>() {
            Ok(v) => Reading::Numeric(v),
            Err(_) => Reading::Invalid(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Reading::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Numeric(v) => Some(*v),
            _ => None,
        }
    }
}

/// One row of the source table
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub city: String,
    pub date: NaiveDate,
    /// Aligned with `Dataset::pollutants`
    pub measurements: Vec<Reading>,
    pub aqi: Reading,
    pub aqi_bucket: Option<String>,
}

impl Observation {
    /// True when every field holds a value
    pub fn is_complete(&self) -> bool {
        !self.aqi.is_missing()
            && self.aqi_bucket.is_some()
            && self.measurements.iter().all(|m| !m.is_missing())
    }
}

/// Loaded table: pollutant column names plus rows in file order
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub pollutants: Vec<String>,
    pub observations: Vec<Observation>,
}

/// Observations of one city, ascending by date
#[derive(Debug, Clone, PartialEq)]
pub struct CitySeries {
    pub city: String,
    pub observations: Vec<Observation>,
}

impl CitySeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
