//! API client library for reelscout.
//!
//! Provides a cached client for the TMDB API v3.

/// TMDB API client.
pub mod tmdb;
