use hyper::StatusCode;
use thiserror::Error;

/// Startup configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Why a single probe request did not succeed. Only ever logged, never
/// surfaced to the caller of a run.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Transport error: {0:#}")]
    Transport(anyhow::Error),

    #[error("Target answered with status {0}")]
    Status(StatusCode),

    #[error("Could not build request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}
