//! Error types for EODH API operations.

use thiserror::Error;

/// Errors that can occur during EODH API operations.
#[derive(Debug, Error)]
pub enum EodhError {
    /// Configuration is missing or incomplete.
    #[error("EODH configuration required: {0}")]
    ConfigMissing(String),

    /// API request failed with a non-success status.
    #[error("EODH API error ({}): {message}", status_label(.status_code))]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// A resource has no hyperlink with the requested relation.
    #[error("{entity_type} has no link with rel '{rel}'")]
    MissingLink {
        entity_type: &'static str,
        rel: String,
    },

    /// An expected response header was absent.
    #[error("Response did not include the '{0}' header")]
    MissingHeader(&'static str),

    /// The API does not advertise the conformance classes an operation needs.
    #[error("API does not conform to {}", .0.join(", "))]
    Conformance(Vec<String>),

    /// A path segment could not be joined onto a URL.
    #[error("Invalid path '{0}': only the first segment may start with '/'")]
    InvalidPath(String),

    /// An argument combination was rejected before any request was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Local I/O failure (reading a file to upload).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EodhError {
    /// HTTP status code carried by an API error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => *status_code,
            Self::RateLimited { .. } => Some(429),
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error is an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Result type alias for EODH operations.
pub type Result<T> = core::result::Result<T, EodhError>;

fn status_label(status_code: &Option<u16>) -> String {
    status_code.map_or_else(|| "no status".to_string(), |code| format!("HTTP {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformance_error_lists_uris() {
        let err = EodhError::Conformance(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "API does not conform to a, b");
    }

    #[test]
    fn test_api_error_status() {
        let err = EodhError::ApiError {
            message: "nope".to_string(),
            status_code: Some(404),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "EODH API error (HTTP 404): nope");
    }

    #[test]
    fn test_api_error_without_status() {
        let err = EodhError::ApiError {
            message: "broken".to_string(),
            status_code: None,
        };
        assert_eq!(err.to_string(), "EODH API error (no status): broken");
    }

    #[test]
    fn test_rate_limited_status() {
        let err = EodhError::RateLimited {
            retry_after_secs: Some(3),
        };
        assert_eq!(err.status_code(), Some(429));
        assert!(!err.is_not_found());
    }
}
