//! Contains the `ObservationFrame` and `PreparedFrame` wrappers around the polars
//! frames holding uploaded temperature observations.

use crate::frames::error::DataError;
use crate::frames::loader::{read_csv_bytes, read_csv_file};
use crate::types::observation::PreparedObservation;
use chrono::{DateTime, NaiveDateTime};
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// Number of trailing samples in the per-city moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 30;
/// Distance from the seasonal mean, in sample standard deviations, beyond which
/// a reading counts as anomalous.
pub const ANOMALY_SIGMA: f64 = 2.0;

/// Raw observations as read from CSV.
///
/// Holds the `city`, `season` (strings), `temperature` (`f64`) and `timestamp`
/// (millisecond datetime) columns plus whatever else the file contained.
/// Row order is the order of the file.
#[derive(Debug, Clone)]
pub struct ObservationFrame {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
}

impl ObservationFrame {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Reads and coerces a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::CsvReadFile`] if polars cannot read the file and
    /// [`DataError::MissingColumn`] if one of `city`, `timestamp`,
    /// `temperature` or `season` is absent.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, DataError> {
        read_csv_file(path.as_ref()).map(Self::new)
    }

    /// Same as [`ObservationFrame::read_csv`] for content already in memory.
    pub fn from_csv_bytes(bytes: Vec<u8>) -> Result<Self, DataError> {
        read_csv_bytes(bytes).map(Self::new)
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Adds the derived columns used by every analysis:
    ///
    /// * `moving_avg`: trailing mean of up to [`MOVING_AVERAGE_WINDOW`] readings
    ///   of the same city, in file order, needing at least one non-null sample.
    /// * `seasonal_mean` / `seasonal_std`: mean and sample standard deviation
    ///   (ddof = 1) of temperature per `(city, season)`.
    /// * `is_anomaly`: the reading lies more than [`ANOMALY_SIGMA`] seasonal
    ///   standard deviations away from the seasonal mean. Rows whose group has
    ///   no defined deviation (a single reading) or whose temperature is null
    ///   are never anomalous.
    ///
    /// Row order is unchanged.
    pub fn prepare(self) -> Result<PreparedFrame, DataError> {
        let rows = self.frame.height();
        let seasonal_group = [col("city"), col("season")];

        let lower_bound = col("seasonal_mean") - lit(ANOMALY_SIGMA) * col("seasonal_std");
        let upper_bound = col("seasonal_mean") + lit(ANOMALY_SIGMA) * col("seasonal_std");

        let frame = self
            .frame
            .lazy()
            .with_columns([
                col("temperature")
                    .rolling_mean(RollingOptionsFixedWindow {
                        window_size: MOVING_AVERAGE_WINDOW,
                        min_periods: 1,
                        ..Default::default()
                    })
                    .over([col("city")])
                    .alias("moving_avg"),
                col("temperature")
                    .mean()
                    .over(seasonal_group.clone())
                    .alias("seasonal_mean"),
                col("temperature")
                    .std(1)
                    .over(seasonal_group)
                    .alias("seasonal_std"),
            ])
            .with_column(
                when(
                    col("seasonal_std")
                        .is_null()
                        .or(col("seasonal_std").is_nan()),
                )
                .then(lit(false))
                .otherwise(
                    col("temperature")
                        .lt(lower_bound)
                        .or(col("temperature").gt(upper_bound)),
                )
                .fill_null(lit(false))
                .alias("is_anomaly"),
            )
            .collect()?;

        let prepared = PreparedFrame::new(frame);
        info!(
            "Prepared {} observations, {} flagged as anomalous",
            rows,
            prepared.anomaly_count()?
        );
        Ok(prepared)
    }
}

/// Observations with the derived columns added by [`ObservationFrame::prepare`].
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
}

impl PreparedFrame {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Returns a lazy view of the frame for further filtering.
    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    /// Distinct city names in the order they first appear.
    pub fn cities(&self) -> Result<Vec<String>, DataError> {
        let cities = self.frame.column("city")?.str()?;
        let mut seen = HashSet::new();
        Ok(cities
            .into_iter()
            .flatten()
            .filter(|city| seen.insert(*city))
            .map(str::to_string)
            .collect())
    }

    /// Rows belonging to one city, in their original order.
    pub fn for_city(&self, city: &str) -> Result<PreparedFrame, DataError> {
        let frame = self.lazy().filter(col("city").eq(lit(city))).collect()?;
        debug!("Selected {} rows for city {}", frame.height(), city);
        Ok(PreparedFrame::new(frame))
    }

    /// Rows flagged as anomalous.
    pub fn anomalies(&self) -> Result<PreparedFrame, DataError> {
        let frame = self.lazy().filter(col("is_anomaly")).collect()?;
        Ok(PreparedFrame::new(frame))
    }

    pub fn anomaly_count(&self) -> Result<usize, DataError> {
        let flags = self.frame.column("is_anomaly")?.bool()?;
        Ok(flags.into_iter().filter(|flag| *flag == Some(true)).count())
    }

    /// Collects the frame into typed rows.
    pub fn observations(&self) -> Result<Vec<PreparedObservation>, DataError> {
        let city = self.frame.column("city")?.str()?;
        let season = self.frame.column("season")?.str()?;
        let temperature = self.frame.column("temperature")?.f64()?;
        let moving_avg = self.frame.column("moving_avg")?.f64()?;
        let seasonal_mean = self.frame.column("seasonal_mean")?.f64()?;
        let seasonal_std = self.frame.column("seasonal_std")?.f64()?;
        let is_anomaly = self.frame.column("is_anomaly")?.bool()?;
        let epoch_ms = self.frame.column("timestamp")?.cast(&DataType::Int64)?;
        let epoch_ms = epoch_ms.i64()?;

        Ok((0..self.frame.height())
            .map(|idx| PreparedObservation {
                city: city.get(idx).unwrap_or_default().to_string(),
                timestamp: epoch_ms.get(idx).and_then(epoch_millis_to_naive),
                temperature: temperature.get(idx),
                season: season.get(idx).map(str::to_string),
                moving_avg: moving_avg.get(idx),
                seasonal_mean: seasonal_mean.get(idx),
                seasonal_std: seasonal_std.get(idx),
                is_anomaly: is_anomaly.get(idx).unwrap_or(false),
            })
            .collect())
    }
}

pub(crate) fn epoch_millis_to_naive(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}
