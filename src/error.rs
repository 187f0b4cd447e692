use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: access token invalid or expired")]
    Unauthorized,

    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Option<Duration>),

    #[error("Report file {0} not ready within timeout")]
    ReportTimeout(String),

    #[error("Polling timeout exceeded")]
    PollTimeout,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Connection credentials required for impersonated access")]
    CredentialsRequired,

    #[error("Failed to fetch delegated access token: {status} - {message}")]
    TokenFetchFailed { status: u16, message: String },

    #[error("Bad API response: {0}")]
    BadResponse(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
