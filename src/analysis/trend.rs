//! Ordinary-least-squares trend of temperature against time for one city.

use crate::frames::error::DataError;
use crate::frames::observation_frame::{epoch_millis_to_naive, PreparedFrame};
use crate::i18n::Locale;
use chrono::NaiveDateTime;
use log::debug;
use polars::prelude::*;

const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0 * 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendDirection {
    Positive,
    Negative,
}

impl TrendDirection {
    /// Positive only for a strictly positive slope; a flat fit reads as negative.
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            TrendDirection::Positive
        } else {
            TrendDirection::Negative
        }
    }
}

/// Result of [`fit_trend`].
///
/// `timestamps` and `predicted` are aligned with each other and with the rows
/// that went into the fit (non-anomalous rows with both a timestamp and a
/// temperature, in frame order).
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    pub city: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub predicted: Vec<f64>,
    /// °C per millisecond since the Unix epoch.
    pub slope: f64,
    /// Predicted temperature at the Unix epoch.
    pub intercept: f64,
    pub direction: TrendDirection,
}

impl TrendFit {
    pub fn slope_per_year(&self) -> f64 {
        self.slope * MILLIS_PER_YEAR
    }

    /// One-line narrative; the wording depends only on the sign of the slope.
    pub fn description(&self, locale: Locale) -> String {
        locale.trend_description(self.direction == TrendDirection::Positive, &self.city)
    }
}

/// Fits `temperature ~ time` for the rows of one city.
///
/// Anomalous rows are excluded, as are rows without a parsed timestamp or a
/// temperature. Time enters the model as epoch milliseconds.
///
/// # Errors
///
/// Returns [`DataError::EmptyTrendInput`] when no row survives the filtering.
pub fn fit_trend(city_frame: &PreparedFrame, city: &str) -> Result<TrendFit, DataError> {
    let usable = city_frame
        .lazy()
        .filter(
            col("is_anomaly")
                .not()
                .and(col("timestamp").is_not_null())
                .and(col("temperature").is_not_null()),
        )
        .select([
            col("timestamp").cast(DataType::Int64).alias("epoch_ms"),
            col("temperature"),
        ])
        .collect()?;

    let epoch_ms = usable.column("epoch_ms")?.i64()?;
    let temperature = usable.column("temperature")?.f64()?;
    let points: Vec<(i64, f64)> = epoch_ms
        .into_iter()
        .zip(temperature.into_iter())
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();

    if points.is_empty() {
        return Err(DataError::EmptyTrendInput {
            city: city.to_string(),
        });
    }

    let line = LeastSquares::fit(&points);
    let timestamps = points
        .iter()
        .map(|(x, _)| {
            epoch_millis_to_naive(*x).ok_or_else(|| DataError::UnexpectedData {
                city: city.to_string(),
                message: format!("timestamp {x} ms is out of range"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let predicted = points.iter().map(|(x, _)| line.predict(*x)).collect();

    debug!(
        "Trend for {} over {} rows: {:.4} °C/year",
        city,
        points.len(),
        line.slope * MILLIS_PER_YEAR
    );

    Ok(TrendFit {
        city: city.to_string(),
        timestamps,
        predicted,
        slope: line.slope,
        intercept: line.intercept(),
        direction: TrendDirection::from_slope(line.slope),
    })
}

/// Simple linear regression with x shifted to the first sample, so epoch
/// milliseconds do not lose precision when squared.
struct LeastSquares {
    origin: i64,
    mean_x: f64,
    mean_y: f64,
    slope: f64,
}

impl LeastSquares {
    fn fit(points: &[(i64, f64)]) -> Self {
        let origin = points[0].0;
        let n = points.len() as f64;
        let shifted = |x: i64| (x - origin) as f64;

        let mean_x = points.iter().map(|(x, _)| shifted(*x)).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| *y).sum::<f64>() / n;

        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = shifted(*x) - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
        // All samples at the same instant: the fit degenerates to the mean.
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

        Self {
            origin,
            mean_x,
            mean_y,
            slope,
        }
    }

    fn predict(&self, x: i64) -> f64 {
        self.mean_y + self.slope * ((x - self.origin) as f64 - self.mean_x)
    }

    fn intercept(&self) -> f64 {
        self.mean_y - self.slope * (self.mean_x + self.origin as f64)
    }
}
