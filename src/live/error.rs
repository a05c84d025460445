use crate::i18n::{Locale, Text};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemperatureApiError {
    #[error("Weather provider answered {status} for city '{city}'")]
    Provider {
        city: String,
        status: reqwest::StatusCode,
        /// The provider's `message` field, when the error body carried one.
        message: Option<String>,
    },

    #[error("Network request failed for city '{city}'")]
    Network {
        city: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Weather provider sent an unexpected body for city '{city}'")]
    MalformedBody {
        city: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TemperatureApiError {
    pub fn city(&self) -> &str {
        match self {
            TemperatureApiError::Provider { city, .. }
            | TemperatureApiError::Network { city, .. }
            | TemperatureApiError::MalformedBody { city, .. } => city,
        }
    }

    /// The user-facing message. Provider and transport failures share one shape.
    pub fn localized(&self, locale: Locale) -> String {
        let message = match self {
            TemperatureApiError::Provider {
                message: Some(message),
                ..
            } => message.clone(),
            TemperatureApiError::Provider { message: None, .. } => {
                locale.text(Text::UnknownError).to_string()
            }
            TemperatureApiError::Network { source, .. }
            | TemperatureApiError::MalformedBody { source, .. } => source.to_string(),
        };
        locale.api_error(&message)
    }
}
