use thiserror::Error;

/// Errors returned by [`crate::OsuClient`].
#[derive(Debug, Error)]
pub enum OsuApiError {
    /// Network failure or a body that could not be decoded.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("osu! API returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid osu! API base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl OsuApiError {
    /// Client errors other than rate limiting will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            OsuApiError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            OsuApiError::Http(e) => !e.is_decode() && !e.is_builder(),
            OsuApiError::InvalidBaseUrl(_) => false,
        }
    }
}
