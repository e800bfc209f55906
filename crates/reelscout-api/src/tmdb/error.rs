//! `TmdbError` - error type for all TMDB client operations.

/// Errors returned by the TMDB client.
///
/// `Api` and `Cancelled` are kept apart so callers can drop cancelled
/// requests silently while still surfacing upstream failures.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum TmdbError {
    /// Upstream returned a non-success HTTP status.
    #[error("TMDB API error: {status} {status_text}{}", detail_suffix(.message))]
    Api {
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
        /// `status_message` from the TMDB error body, if present.
        message: Option<String>,
    },

    /// The request was aborted through its cancellation token.
    #[error("request cancelled")]
    Cancelled,

    /// No bearer token was configured for the client.
    #[error("TMDB API token is not configured (set TMDB_API_TOKEN)")]
    MissingToken,

    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body or envelope could not be decoded.
    #[error("failed to decode JSON response: {path}")]
    Decode {
        /// Endpoint path the response came from.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Endpoint path could not be joined onto the base URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Formats the optional TMDB `status_message` as a `" (...)"` suffix.
fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map_or_else(String::new, |m| format!(" ({m})"))
}

impl TmdbError {
    /// Returns `true` if the request was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the upstream HTTP status for `Api` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_without_message() {
        // Arrange
        let err = TmdbError::Api {
            status: 500,
            status_text: String::from("Internal Server Error"),
            message: None,
        };

        // Act & Assert
        assert_eq!(err.to_string(), "TMDB API error: 500 Internal Server Error");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_api_error_display_with_message() {
        // Arrange
        let err = TmdbError::Api {
            status: 401,
            status_text: String::from("Unauthorized"),
            message: Some(String::from("Invalid API key")),
        };

        // Act & Assert
        assert_eq!(
            err.to_string(),
            "TMDB API error: 401 Unauthorized (Invalid API key)"
        );
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        // Arrange & Act
        let err = TmdbError::Cancelled;

        // Assert
        assert!(err.is_cancelled());
        assert_eq!(err.status(), None);
    }
}
