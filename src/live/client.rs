//! Provides the `TemperatureClient` for reading the current temperature of a
//! city from OpenWeatherMap's current-conditions endpoint.

use crate::live::error::TemperatureApiError;
use bon::bon;
use futures_util::future::join_all;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const UNITS: &str = "metric";

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

/// Client for live temperature readings.
///
/// Requests carry no timeout and are never retried; a request that hangs keeps
/// its caller waiting.
///
/// # Examples
///
/// ```no_run
/// # use meteodash::TemperatureClient;
/// # #[tokio::main]
/// # async fn main() {
/// let client = TemperatureClient::builder().build();
/// match client.get_temperature("London", "my-api-key").await {
///     Ok(celsius) => println!("London: {celsius} °C"),
///     Err(e) => eprintln!("{e}"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TemperatureClient {
    http: Client,
    base_url: String,
}

#[bon]
impl TemperatureClient {
    /// Creates a client.
    ///
    /// * `.base_url(String)`: Optional. Endpoint to query, defaults to [`DEFAULT_API_URL`].
    /// * `.http(reqwest::Client)`: Optional. Shared HTTP client, a new one is created otherwise.
    #[builder]
    pub fn new(base_url: Option<String>, http: Option<Client>) -> Self {
        Self {
            http: http.unwrap_or_default(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the current temperature of `city` in °C.
    ///
    /// # Errors
    ///
    /// * [`TemperatureApiError::Provider`] for any status other than 200, with the
    ///   provider's `message` when the body has one.
    /// * [`TemperatureApiError::Network`] when the request could not be sent or
    ///   the connection failed.
    /// * [`TemperatureApiError::MalformedBody`] when a 200 body has no numeric
    ///   `main.temp`.
    pub async fn get_temperature(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<f64, TemperatureApiError> {
        debug!("Requesting current temperature for {}", city);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", city), ("appid", api_key), ("units", UNITS)])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!("Request for {} failed: {}", city, e);
                TemperatureApiError::Network {
                    city: city.to_string(),
                    // The URL carries the API key.
                    source: e,
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response
                .json::<ProviderError>()
                .await
                .ok()
                .and_then(|body| body.message);
            warn!("Provider answered {} for {}: {:?}", status, city, message);
            return Err(TemperatureApiError::Provider {
                city: city.to_string(),
                status,
                message,
            });
        }

        let body: CurrentConditions = response.json().await.map_err(|e| {
            TemperatureApiError::MalformedBody {
                city: city.to_string(),
                source: e.without_url(),
            }
        })?;
        debug!("{} is at {} °C", city, body.main.temp);
        Ok(body.main.temp)
    }

    /// Fetches every city concurrently on the current task and waits for all
    /// of them.
    ///
    /// The map holds one entry per distinct requested city; a failed request
    /// only affects its own entry.
    pub async fn get_many_temperatures<S: AsRef<str>>(
        &self,
        cities: &[S],
        api_key: &str,
    ) -> HashMap<String, Result<f64, TemperatureApiError>> {
        let requests = cities.iter().map(|city| async move {
            let city = city.as_ref();
            (city.to_string(), self.get_temperature(city, api_key).await)
        });
        let results: HashMap<_, _> = join_all(requests).await.into_iter().collect();

        let failed = results.values().filter(|result| result.is_err()).count();
        info!(
            "Fetched live temperatures for {} cities ({} failed)",
            results.len(),
            failed
        );
        results
    }
}

impl Default for TemperatureClient {
    fn default() -> Self {
        Self::builder().build()
    }
}
