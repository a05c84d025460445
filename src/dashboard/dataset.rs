//! The uploaded dataset with everything derived from it, computed once per upload.

use crate::analysis::stats::{city_stats, CityStats};
use crate::analysis::trend::{fit_trend, TrendFit};
use crate::frames::error::DataError;
use crate::frames::observation_frame::{ObservationFrame, PreparedFrame};
use crate::types::observation::PreparedObservation;
use log::{info, warn};

/// Per-city slice of a [`Dataset`] with its summary and trend.
#[derive(Debug)]
pub struct CityAnalysis {
    pub city: String,
    pub frame: PreparedFrame,
    /// Collected rows of `frame`, for the city tab.
    pub observations: Vec<PreparedObservation>,
    pub stats: CityStats,
    /// A city whose rows are all anomalous or undated has no trend.
    pub trend: Result<TrendFit, DataError>,
}

#[derive(Debug)]
pub struct Dataset {
    /// File name of the upload, shown on the page.
    pub source_name: String,
    pub frame: PreparedFrame,
    /// In order of first appearance in the file.
    pub cities: Vec<CityAnalysis>,
    /// Flagged rows of every city.
    pub anomalies: Vec<PreparedObservation>,
}

impl Dataset {
    /// Runs preparation, then per-city statistics and trend fitting.
    pub fn from_observations(
        source_name: impl Into<String>,
        observations: ObservationFrame,
    ) -> Result<Self, DataError> {
        let source_name = source_name.into();
        let frame = observations.prepare()?;

        let cities = frame
            .cities()?
            .into_iter()
            .map(|city| {
                let city_frame = frame.for_city(&city)?;
                let observations = city_frame.observations()?;
                let stats = city_stats(&city_frame, &city)?;
                let trend = fit_trend(&city_frame, &city);
                if let Err(e) = &trend {
                    warn!("No trend for {}: {}", city, e);
                }
                Ok::<_, DataError>(CityAnalysis {
                    city,
                    frame: city_frame,
                    observations,
                    stats,
                    trend,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let anomalies = frame.anomalies()?.observations()?;

        info!(
            "Dataset '{}' ready: {} rows, {} cities, {} anomalies",
            source_name,
            frame.height(),
            cities.len(),
            anomalies.len()
        );
        Ok(Self {
            source_name,
            frame,
            cities,
            anomalies,
        })
    }

    pub fn from_csv_bytes(source_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DataError> {
        Self::from_observations(source_name, ObservationFrame::from_csv_bytes(bytes)?)
    }

    pub fn city(&self, name: &str) -> Option<&CityAnalysis> {
        self.cities.iter().find(|analysis| analysis.city == name)
    }

    pub fn city_names(&self) -> Vec<&str> {
        self.cities.iter().map(|analysis| analysis.city.as_str()).collect()
    }
}
