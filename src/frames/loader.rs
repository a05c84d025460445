//! Reads observation CSVs into polars frames with the column types the rest of
//! the crate relies on.

use crate::frames::error::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{info, warn};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

pub(crate) const REQUIRED_COLUMNS: [&str; 4] = ["city", "timestamp", "temperature", "season"];

// `%.f` also matches timestamps without a fractional part.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Parses a timestamp cell, returning `None` for anything unrecognised.
///
/// RFC 3339 values keep their local wall-clock time and the offset is dropped, so a
/// reading stays on the calendar day it was taken. Date-only values map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Reads a CSV file from disk.
pub fn read_csv_file(path: &Path) -> Result<DataFrame, DataError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| DataError::CsvReadFile(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| DataError::CsvReadFile(path.to_path_buf(), e))?;
    info!("Read {} rows from {}", df.height(), path.display());
    normalize_columns(df)
}

/// Reads CSV content that is already in memory, e.g. an uploaded file.
pub fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame, DataError> {
    let size = bytes.len();
    // Every column is read as text, typed columns are coerced afterwards.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(DataError::CsvParse)?;
    info!("Parsed {} rows from {} bytes of CSV", df.height(), size);
    normalize_columns(df)
}

/// Checks the required columns and coerces them: temperature to `f64`,
/// timestamp to a millisecond datetime, city and season to strings.
/// Cells that cannot be coerced become null.
fn normalize_columns(df: DataFrame) -> Result<DataFrame, DataError> {
    for column in REQUIRED_COLUMNS {
        if df.column(column).is_err() {
            warn!("Uploaded data is missing required column '{}'", column);
            return Err(DataError::MissingColumn(column));
        }
    }

    let timestamps = coerce_timestamps(df.column("timestamp")?)?;

    let mut df = df
        .lazy()
        .with_columns([
            col("city").cast(DataType::String),
            col("season").cast(DataType::String),
            col("temperature").cast(DataType::Float64),
        ])
        .collect()?;
    df.with_column(timestamps)?;
    Ok(df)
}

fn coerce_timestamps(column: &Column) -> Result<Series, DataError> {
    let raw = column.cast(&DataType::String)?;
    let raw = raw.str()?;

    let mut rejected = 0usize;
    let millis: Vec<Option<i64>> = raw
        .into_iter()
        .map(|cell| {
            let parsed = cell.and_then(parse_timestamp);
            if cell.is_some() && parsed.is_none() {
                rejected += 1;
            }
            parsed.map(|dt| dt.and_utc().timestamp_millis())
        })
        .collect();

    if rejected > 0 {
        warn!("{} timestamp value(s) could not be parsed and were set to null", rejected);
    }

    Series::new("timestamp".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(DataError::from)
}
