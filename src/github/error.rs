//! API client error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by [`GithubClient`](crate::github::GithubClient)
#[derive(Debug, Error)]
pub enum ClientError {
    /// The credential's call quota is spent. This is a control signal for
    /// credential rotation rather than a failure, and is never retried locally.
    #[error("API quota exhausted (resets at {})", format_reset(.reset_at))]
    QuotaExceeded { reset_at: Option<DateTime<Utc>> },

    /// The platform could not be reached (connect failure, timeout, broken transfer)
    #[error("API unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    #[error("HTTP {status} for {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Credential contains characters that cannot be sent in a header")]
    InvalidCredential,
}

impl ClientError {
    /// Returns true if this error signals quota exhaustion
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Returns true if this error means the platform was unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns true if the error concerns a single path and the caller may
    /// skip it and move on
    pub fn is_entry_scoped(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Decode { .. })
    }
}

fn format_reset(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => at.to_rfc3339(),
        None => "unknown".to_string(),
    }
}

/// Result type for API client operations
pub type ClientResult<T> = Result<T, ClientError>;
