use chrono::NaiveDateTime;

/// A collected row of a prepared observation frame.
#[derive(Debug, PartialEq, Clone)]
pub struct PreparedObservation {
    pub city: String,
    pub timestamp: Option<NaiveDateTime>, // null when the raw value did not parse
    pub temperature: Option<f64>,         // °C
    pub season: Option<String>,
    pub moving_avg: Option<f64>,    // trailing 30-sample mean for the city
    pub seasonal_mean: Option<f64>, // mean over (city, season)
    pub seasonal_std: Option<f64>,  // sample std over (city, season)
    pub is_anomaly: bool,
}
