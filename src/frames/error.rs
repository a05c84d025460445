use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read CSV file '{0}'")]
    CsvReadFile(PathBuf, #[source] PolarsError),

    #[error("Failed to parse uploaded CSV data")]
    CsvParse(#[source] PolarsError),

    #[error("Required column '{0}' not found in the uploaded data")]
    MissingColumn(&'static str),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("No usable observations left to fit a trend for city '{city}'")]
    EmptyTrendInput { city: String },

    #[error("Unexpected data state for city '{city}': {message}")]
    UnexpectedData { city: String, message: String },
}
