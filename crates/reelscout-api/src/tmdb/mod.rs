//! TMDB API client module.
//!
//! Wraps TMDB API v3 requests with a URL-keyed in-memory response cache,
//! builds discover/search query parameters from UI filters, and exposes
//! typed wrappers for the listing, search, details, genre and keyword
//! endpoints.

mod api;
mod cache;
mod client;
mod error;
mod params;
mod sweeper;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
pub use cache::{CacheConfig, CacheEntry, ResponseCache};
#[allow(clippy::module_name_repetitions)]
pub use client::{API_TOKEN_ENV, TmdbClient, TmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::TmdbError;
pub use params::{DurationBucket, Filters, QueryMode, QueryParams, build_params, build_params_for};
pub use sweeper::CacheSweeper;
pub use types::{
    Genre, Keyword, MediaType, PagedResults, ParseMediaTypeError, RequestOptions,
};
