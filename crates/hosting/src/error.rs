//! Transport adapter error types.

use std::time::Duration;

use sitedeploy_protocol::ErrorEnvelope;

/// Errors from the hosting API adapter.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid bearer token")]
    InvalidToken,

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Builds an [`ApiError::Api`] from a non-2xx response.
    ///
    /// The message comes from the `{"error": {...}}` envelope when present,
    /// otherwise from the raw body.
    pub fn from_response(status: u16, body: String) -> Self {
        let message = match ErrorEnvelope::parse(&body) {
            Some(env) => env.error.message,
            None if body.trim().is_empty() => format!("HTTP {status}"),
            None => body.chars().take(200).collect(),
        };
        Self::Api {
            status,
            message,
            body,
        }
    }

    /// HTTP status of the failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body, if the server answered with one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether another attempt might succeed.
    ///
    /// Transport failures, timeouts, 429 and 5xx are transient. Any other
    /// 4xx means the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.status().is_none_or(|s| s.as_u16() == 429 || s.is_server_error()),
            Self::Timeout(_) => true,
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Json(_) | Self::InvalidToken | Self::Unexpected(_) => false,
        }
    }
}
