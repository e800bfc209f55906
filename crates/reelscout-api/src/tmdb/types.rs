//! TMDB API envelope types and request options.
//!
//! Result items stay opaque (`serde_json::Value`); only the envelopes that
//! the client unwraps get a concrete shape.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

// --- Media Type ---

/// Media kind used in TMDB paths (`movie/...`, `tv/...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    /// Feature films.
    #[default]
    Movie,
    /// TV series.
    Tv,
}

impl MediaType {
    /// Returns the path segment TMDB uses for this media type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown media type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media type '{0}' (expected 'movie' or 'tv')")]
pub struct ParseMediaTypeError(String);

impl FromStr for MediaType {
    type Err = ParseMediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            _ => Err(ParseMediaTypeError(String::from(s))),
        }
    }
}

// --- Envelopes ---

/// Paginated list response (`{results, total_pages}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PagedResults {
    /// Result items, passed through as-is.
    #[serde(default)]
    pub results: Vec<Value>,
    /// Total number of pages reported by TMDB.
    #[serde(default)]
    pub total_pages: u32,
}

/// Envelope for list endpoints whose only consumer is `results`.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultsEnvelope<T> {
    /// Result items.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Envelope for `genre/{media}/list`.
#[derive(Debug, Deserialize)]
pub(crate) struct GenresEnvelope {
    /// Genre entries.
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Keyword suggestion from `search/keyword`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Keyword {
    /// TMDB keyword ID.
    pub id: u64,
    /// Keyword text.
    pub name: String,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TmdbErrorResponse {
    /// TMDB error code.
    #[allow(dead_code)]
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
}

// --- Request Options ---

/// Per-request options for the cached executor.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Skip the cache lookup and always hit the network.
    pub bypass_cache: bool,
    /// Aborts the in-flight request when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    /// Creates default options (cache enabled, no cancellation).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a network call, overwriting any cached entry.
    #[must_use]
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_media_type_from_str() {
        // Arrange & Act & Assert
        assert_eq!("movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!("TV".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert!("anime".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_media_type_display() {
        // Arrange & Act & Assert
        assert_eq!(MediaType::Movie.to_string(), "movie");
        assert_eq!(MediaType::Tv.to_string(), "tv");
    }

    #[test]
    fn test_parse_paged_results() {
        // Arrange
        let json = r#"{"page":1,"results":[{"id":1,"title":"Inception"}],"total_pages":7,"total_results":140}"#;

        // Act
        let paged: PagedResults = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(paged.total_pages, 7);
        assert_eq!(paged.results.len(), 1);
        assert_eq!(paged.results[0]["title"], "Inception");
    }

    #[test]
    fn test_parse_paged_results_missing_fields() {
        // Arrange
        let json = r"{}";

        // Act
        let paged: PagedResults = serde_json::from_str(json).unwrap();

        // Assert
        assert!(paged.results.is_empty());
        assert_eq!(paged.total_pages, 0);
    }

    #[test]
    fn test_parse_error_response() {
        // Arrange
        let json = r#"{"status_code":34,"status_message":"The resource you requested could not be found.","success":false}"#;

        // Act
        let error: TmdbErrorResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(error.status_code, 34);
        assert!(error.status_message.contains("could not be found"));
    }

    #[test]
    fn test_request_options_builder() {
        // Arrange
        let token = CancellationToken::new();

        // Act
        let opts = RequestOptions::new()
            .bypass_cache(true)
            .cancel_token(token.clone());

        // Assert
        assert!(opts.bypass_cache);
        assert!(opts.cancel.is_some());
    }
}
