use crate::frames::error::DataError;
use axum::extract::multipart::MultipartError;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Failed to read the uploaded form")]
    Upload(#[from] MultipartError),

    #[error("The upload form has no 'file' field")]
    MissingUpload,

    #[error("Failed to bind the dashboard to {0}")]
    Bind(SocketAddr, #[source] std::io::Error),

    #[error("The dashboard server stopped")]
    Serve(#[source] std::io::Error),
}

/// Formats an error followed by each of its sources, separated by `: `.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
