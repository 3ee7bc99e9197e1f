use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::info;

use crate::data::observation::{Dataset, Observation, Reading};
use crate::error::{AqiError, Result};

pub const CITY_COLUMN: &str = "City";
pub const DATE_COLUMN: &str = "Date";
pub const AQI_COLUMN: &str = "AQI";
pub const BUCKET_COLUMN: &str = "AQI_Bucket";

// Day-first first; ISO is unambiguous so it is accepted too
const DATE_FORMATS: [&str; 4] = ["%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d"];

struct Columns {
    city: usize,
    date: usize,
    aqi: usize,
    bucket: usize,
    pollutants: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| AqiError::ParseError(format!("missing required column '{}'", name)))
        };

        let city = find(CITY_COLUMN)?;
        let date = find(DATE_COLUMN)?;
        let aqi = find(AQI_COLUMN)?;
        let bucket = find(BUCKET_COLUMN)?;

        let pollutants = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| ![city, date, aqi, bucket].contains(i))
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self { city, date, aqi, bucket, pollutants })
    }
}

/// Load a CSV file into a `Dataset`
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading dataset");
    let file = File::open(path)?;
    read_dataset(file)
}

/// Parse CSV content from any reader. Rows keep file order and duplicates are kept.
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut observations = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = row + 2;
        observations.push(parse_record(&record, &columns, line)?);
    }

    info!(
        rows = observations.len(),
        pollutants = columns.pollutants.len(),
        "Dataset loaded"
    );

    Ok(Dataset {
        pollutants: columns.pollutants.into_iter().map(|(_, name)| name).collect(),
        observations,
    })
}

fn parse_record(record: &StringRecord, columns: &Columns, line: usize) -> Result<Observation> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let city = field(columns.city).trim();
    if city.is_empty() {
        return Err(AqiError::ParseError(format!("line {}: empty city", line)));
    }

    let raw_date = field(columns.date);
    let date = parse_day_first(raw_date).ok_or_else(|| {
        AqiError::ParseError(format!("line {}: unparseable date '{}'", line, raw_date))
    })?;

    let measurements = columns
        .pollutants
        .iter()
        .map(|(idx, _)| Reading::parse(field(*idx)))
        .collect();

    let bucket = field(columns.bucket).trim();

    Ok(Observation {
        city: city.to_string(),
        date,
        measurements,
        aqi: Reading::parse(field(columns.aqi)),
        aqi_bucket: if bucket.is_empty() { None } else { Some(bucket.to_string()) },
    })
}

/// Parse a date string, reading ambiguous numeric dates as day-first
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in &DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, format) {
            return Some(d);
        }
        let with_time = format!("{} %H:%M:%S", format);
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, &with_time) {
            return Some(dt.date());
        }
    }
    None
}
