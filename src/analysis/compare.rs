//! Compares a live reading with what the same calendar day looked like in
//! previous years.

use crate::frames::error::DataError;
use crate::frames::observation_frame::PreparedFrame;
use crate::i18n::{Locale, Text};
use chrono::{Datelike, NaiveDate};
use log::debug;
use polars::prelude::*;

/// How far a reading lies from the historical median, in historical standard
/// deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assessment {
    /// `|deviation| < std`
    Normal,
    /// `std <= |deviation| < 2 * std`
    SlightlyOff,
    /// `|deviation| >= 2 * std`
    SignificantlyOff,
}

impl Assessment {
    /// Bands are half-open, so a deviation of exactly one (two) standard
    /// deviation(s) already falls in the next band. With `std == 0` every
    /// reading is significantly off.
    pub fn classify(deviation: f64, std: f64) -> Self {
        let magnitude = deviation.abs();
        if magnitude < std {
            Assessment::Normal
        } else if magnitude < 2.0 * std {
            Assessment::SlightlyOff
        } else {
            Assessment::SignificantlyOff
        }
    }

    pub fn text(&self, locale: Locale) -> &'static str {
        match self {
            Assessment::Normal => locale.text(Text::AssessmentNormal),
            Assessment::SlightlyOff => locale.text(Text::AssessmentSlightlyOff),
            Assessment::SignificantlyOff => locale.text(Text::AssessmentSignificantlyOff),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub city: String,
    pub date: NaiveDate,
    pub actual: f64,
    /// Median of the matching historical readings.
    pub median: f64,
    /// Sample standard deviation; `None` for a single matching reading.
    pub std: Option<f64>,
    pub deviation: f64,
    pub samples: usize,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryComparison {
    /// No non-anomalous reading of the city on that month and day.
    NoData { city: String, date: NaiveDate },
    Compared(ComparisonReport),
}

impl HistoryComparison {
    /// Multi-line report as shown on the dashboard.
    pub fn render(&self, locale: Locale) -> String {
        match self {
            HistoryComparison::NoData { city, .. } => locale.no_history(city),
            HistoryComparison::Compared(report) => format!(
                "{}: {}\n{}: {}°C\n{}: {:.2}°C\n{}: {:.2}°C\n{}: {}\n",
                locale.text(Text::ReportCity),
                report.city,
                locale.text(Text::ReportActual),
                report.actual,
                locale.text(Text::ReportHistorical),
                report.median,
                locale.text(Text::ReportDeviation),
                report.deviation,
                locale.text(Text::ReportConclusion),
                report.assessment.text(locale),
            ),
        }
    }
}

/// Compares `actual_temp` with non-anomalous readings of `city` taken on the
/// same month and day as `date`, in any year.
pub fn compare_to_history(
    date: NaiveDate,
    actual_temp: f64,
    city: &str,
    frame: &PreparedFrame,
) -> Result<HistoryComparison, DataError> {
    let history = frame
        .lazy()
        .filter(
            col("city")
                .eq(lit(city))
                .and(col("timestamp").dt().month().eq(lit(date.month() as i32)))
                .and(col("timestamp").dt().day().eq(lit(date.day() as i32)))
                .and(col("is_anomaly").not())
                .and(col("temperature").is_not_null()),
        )
        .select([
            col("temperature").median().alias("median"),
            col("temperature").std(1).alias("std"),
            len().cast(DataType::Int64).alias("samples"),
        ])
        .collect()?;

    let samples = history
        .column("samples")?
        .i64()?
        .get(0)
        .unwrap_or_default();
    let median = history.column("median")?.f64()?.get(0);

    let median = match median {
        Some(median) if samples > 0 => median,
        _ => {
            debug!("No history for {} on {}", city, date.format("%m-%d"));
            return Ok(HistoryComparison::NoData {
                city: city.to_string(),
                date,
            });
        }
    };

    let std = history
        .column("std")?
        .f64()?
        .get(0)
        .filter(|std| !std.is_nan());
    let deviation = actual_temp - median;

    Ok(HistoryComparison::Compared(ComparisonReport {
        city: city.to_string(),
        date,
        actual: actual_temp,
        median,
        std,
        deviation,
        samples: samples as usize,
        assessment: Assessment::classify(deviation, std.unwrap_or(0.0)),
    }))
}
