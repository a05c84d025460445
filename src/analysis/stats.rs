//! Summary statistics for one city's slice of the prepared data.

use crate::frames::error::DataError;
use crate::frames::observation_frame::{epoch_millis_to_naive, PreparedFrame};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Mean and sample standard deviation of temperature in one season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalProfile {
    pub season: Option<String>,
    pub mean: Option<f64>,
    pub std: Option<f64>, // undefined for a season with a single reading
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityStats {
    pub city: String,
    pub rows: usize,
    pub anomalies: usize,
    pub min_temperature: Option<f64>,
    pub average_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub first_observation: Option<NaiveDateTime>,
    pub last_observation: Option<NaiveDateTime>,
    /// Sorted by season name.
    pub seasonal_profile: Vec<SeasonalProfile>,
}

/// Computes min/mean/max over every row of `city_frame` (anomalies included)
/// and the per-season profile.
pub fn city_stats(city_frame: &PreparedFrame, city: &str) -> Result<CityStats, DataError> {
    let summary = city_frame
        .lazy()
        .select([
            col("temperature").min().alias("min"),
            col("temperature").mean().alias("mean"),
            col("temperature").max().alias("max"),
            col("timestamp").min().cast(DataType::Int64).alias("first"),
            col("timestamp").max().cast(DataType::Int64).alias("last"),
        ])
        .collect()?;

    let profile = city_frame
        .lazy()
        .group_by([col("season")])
        .agg([
            col("temperature").mean().alias("mean"),
            col("temperature").std(1).alias("std"),
        ])
        .sort_by_exprs([col("season")], SortMultipleOptions::default())
        .collect()?;

    let seasons = profile.column("season")?.str()?;
    let means = profile.column("mean")?.f64()?;
    let stds = profile.column("std")?.f64()?;
    let seasonal_profile = (0..profile.height())
        .map(|idx| SeasonalProfile {
            season: seasons.get(idx).map(str::to_string),
            mean: means.get(idx),
            std: stds.get(idx).filter(|std| !std.is_nan()),
        })
        .collect();

    Ok(CityStats {
        city: city.to_string(),
        rows: city_frame.height(),
        anomalies: city_frame.anomaly_count()?,
        min_temperature: first_f64(&summary, "min")?,
        average_temperature: first_f64(&summary, "mean")?,
        max_temperature: first_f64(&summary, "max")?,
        first_observation: first_i64(&summary, "first")?.and_then(epoch_millis_to_naive),
        last_observation: first_i64(&summary, "last")?.and_then(epoch_millis_to_naive),
        seasonal_profile,
    })
}

fn first_f64(df: &DataFrame, name: &str) -> Result<Option<f64>, DataError> {
    Ok(df.column(name)?.f64()?.get(0))
}

fn first_i64(df: &DataFrame, name: &str) -> Result<Option<i64>, DataError> {
    Ok(df.column(name)?.i64()?.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::prepared_from_rows;
    use chrono::NaiveDate;

    #[test]
    fn test_city_stats_min_mean_max() -> Result<(), Box<dyn std::error::Error>> {
        let prepared = prepared_from_rows(&[
            ("Dubai", "2020-07-01".to_string(), 40.0, "summer"),
            ("Dubai", "2020-01-01".to_string(), 20.0, "winter"),
            ("Dubai", "2020-07-02".to_string(), 42.0, "summer"),
            ("Dubai", "2020-01-02".to_string(), 22.0, "winter"),
            ("Oslo", "2020-01-01".to_string(), -10.0, "winter"),
        ])?;
        let dubai = prepared.for_city("Dubai")?;
        let stats = city_stats(&dubai, "Dubai")?;

        assert_eq!(stats.rows, 4);
        assert_eq!(stats.min_temperature, Some(20.0));
        assert_eq!(stats.average_temperature, Some(31.0));
        assert_eq!(stats.max_temperature, Some(42.0));
        assert_eq!(
            stats.first_observation.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert_eq!(
            stats.last_observation.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2020, 7, 2)
        );

        let seasons: Vec<_> = stats
            .seasonal_profile
            .iter()
            .map(|p| p.season.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(seasons, vec!["summer", "winter"]);
        assert_eq!(stats.seasonal_profile[0].mean, Some(41.0));
        let std = stats.seasonal_profile[1].std.unwrap();
        assert!((std - 2f64.sqrt()).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_single_reading_season_has_no_std() -> Result<(), Box<dyn std::error::Error>> {
        let prepared = prepared_from_rows(&[("Oslo", "2020-01-01".to_string(), -10.0, "winter")])?;
        let stats = city_stats(&prepared, "Oslo")?;
        assert_eq!(stats.seasonal_profile.len(), 1);
        assert_eq!(stats.seasonal_profile[0].std, None);
        assert_eq!(stats.anomalies, 0);
        Ok(())
    }
}
