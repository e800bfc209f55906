//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use serde_json::Value;

use super::error::TmdbError;
use super::params::Filters;
use super::types::{Genre, Keyword, MediaType, PagedResults, RequestOptions};

/// TMDB API trait.
///
/// Abstracts the endpoint wrappers for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Every method propagates `TmdbError` from the executor unchanged.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches this week's trending titles.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn trending(&self, media: MediaType, opts: &RequestOptions)
    -> Result<Vec<Value>, TmdbError>;

    /// Fetches popular movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn popular_movies(&self, opts: &RequestOptions) -> Result<Vec<Value>, TmdbError>;

    /// Fetches top-rated movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn top_rated_movies(&self, opts: &RequestOptions) -> Result<Vec<Value>, TmdbError>;

    /// Fetches upcoming movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn upcoming_movies(&self, opts: &RequestOptions) -> Result<Vec<Value>, TmdbError>;

    /// Fetches the default discover listing (popularity order, page 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn recommended(
        &self,
        media: MediaType,
        opts: &RequestOptions,
    ) -> Result<Vec<Value>, TmdbError>;

    /// Searches movies by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError>;

    /// Lists movies matching the filters (search or discover endpoint).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn discover_movies(
        &self,
        filters: &Filters,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError>;

    /// Lists TV series matching the filters (search or discover endpoint).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn discover_tv(
        &self,
        filters: &Filters,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError>;

    /// Fetches item details with credits, videos, recommendations and similar titles.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn details(
        &self,
        media: MediaType,
        id: u64,
        opts: &RequestOptions,
    ) -> Result<Value, TmdbError>;

    /// Fetches the genre list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn genres(&self, media: MediaType, opts: &RequestOptions)
    -> Result<Vec<Genre>, TmdbError>;

    /// Fetches keyword suggestions for a text fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is cancelled, or cannot be decoded.
    async fn keywords(&self, query: &str, opts: &RequestOptions)
    -> Result<Vec<Keyword>, TmdbError>;
}
