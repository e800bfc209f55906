//! `TmdbClient` - cached TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalTmdbApi;
use super::cache::{CacheConfig, ResponseCache};
use super::error::TmdbError;
use super::params::{Filters, LANGUAGE, build_params_for};
use super::sweeper::CacheSweeper;
use super::types::{
    Genre, GenresEnvelope, Keyword, MediaType, PagedResults, RequestOptions, ResultsEnvelope,
    TmdbErrorResponse,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Environment variable holding the TMDB read-access token.
pub const API_TOKEN_ENV: &str = "TMDB_API_TOKEN";

/// Sub-resources bundled into every details request.
const DETAILS_APPEND: &str = "credits,videos,recommendations,similar";

/// TMDB API client with an in-memory response cache.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token. Checked on every request.
    api_token: Option<String>,
    /// Response cache shared with the sweeper task.
    cache: Arc<Mutex<ResponseCache>>,
    /// Cache settings.
    cache_config: CacheConfig,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    cache_config: CacheConfig,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            cache_config: CacheConfig::default(),
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token.
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Reads the API bearer token from `TMDB_API_TOKEN`, if set and non-empty.
    ///
    /// A missing token is reported by the first request, not here.
    #[must_use]
    pub fn api_token_from_env(mut self) -> Self {
        self.api_token = std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());
        self
    }

    /// Sets the User-Agent (default: `reelscout-api/<version>`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Replaces all cache settings.
    #[must_use]
    pub const fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Sets the cache TTL (default: 10 minutes).
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_config.ttl = ttl;
        self
    }

    /// Sets the maximum number of cached responses (default: 500).
    #[must_use]
    pub const fn max_cache_entries(mut self, max: usize) -> Self {
        self.cache_config.max_entries = max;
        self
    }

    /// Sets the background sweep period (default: 5 minutes).
    #[must_use]
    pub const fn sweep_interval(mut self, interval: Duration) -> Self {
        self.cache_config.sweep_interval = interval;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - The default base URL fails to parse.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient, TmdbError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let user_agent = self.user_agent.unwrap_or_else(|| {
            String::from(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        });

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_token: self.api_token,
            cache: Arc::new(Mutex::new(ResponseCache::from_config(&self.cache_config))),
            cache_config: self.cache_config,
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Returns the cache settings.
    #[must_use]
    pub const fn cache_config(&self) -> &CacheConfig {
        &self.cache_config
    }

    /// Starts the periodic cache sweep on the current tokio runtime.
    ///
    /// The returned handle stops the sweep when dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start_sweeper(&self) -> CacheSweeper {
        tracing::debug!(
            interval_secs = self.cache_config.sweep_interval.as_secs(),
            "starting cache sweeper"
        );
        CacheSweeper::spawn(&self.cache, self.cache_config.sweep_interval)
    }

    /// Runs one expiry sweep immediately. Returns the number of removed entries.
    pub async fn sweep_cache(&self) -> usize {
        self.cache.lock().await.sweep()
    }

    /// Number of cached responses (fresh or not).
    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Drops every cached response.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Resolves `path` and `query` into the absolute request URL.
    ///
    /// The serialized URL doubles as the cache key.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be joined onto the base URL.
    pub fn request_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, TmdbError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Sends a GET request through the response cache.
    ///
    /// A fresh cached response is returned without any I/O unless
    /// `opts.bypass_cache` is set. Successful responses are cached;
    /// failures never are.
    ///
    /// # Errors
    ///
    /// - `MissingToken` if no API token is configured.
    /// - `Cancelled` if `opts.cancel` fires before the response arrives.
    /// - `Api` on a non-success HTTP status.
    /// - `Http` / `Decode` on transport or JSON failures.
    pub async fn fetch_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        opts: &RequestOptions,
    ) -> Result<Value, TmdbError> {
        self.fetch_as(path, query, opts).await
    }

    /// Fetches through the cache and decodes into `T`.
    ///
    /// The body is stored only after it decodes, so a response with a
    /// malformed envelope is refetched on the next call.
    #[instrument(skip_all, fields(path = %path))]
    async fn fetch_as<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        opts: &RequestOptions,
    ) -> Result<T, TmdbError> {
        let token = self.api_token.as_deref().ok_or(TmdbError::MissingToken)?;

        if opts.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(TmdbError::Cancelled);
        }

        let url = self.request_url(path, query)?;
        let key = url.to_string();

        if !opts.bypass_cache {
            let cached = self.cache.lock().await.get(&key).cloned();
            if let Some(data) = cached {
                tracing::debug!(url = %key, "TMDB cache hit");
                return decode(path, &data);
            }
        }

        tracing::debug!(url = %key, bypass = opts.bypass_cache, "TMDB API request");

        let request = self.send(url, token, path);
        let data = match opts.cancel.as_ref() {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        tracing::debug!(url = %key, "TMDB API request cancelled");
                        return Err(TmdbError::Cancelled);
                    }
                    result = request => result?,
                }
            }
            None => request.await?,
        };

        let decoded = decode(path, &data)?;
        self.cache.lock().await.insert(key, data);
        Ok(decoded)
    }

    /// Performs the HTTP call and parses the JSON body.
    async fn send(&self, url: Url, token: &str, path: &str) -> Result<Value, TmdbError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json;charset=utf-8",
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            let message = serde_json::from_str::<TmdbErrorResponse>(&body)
                .map(|e| e.status_message)
                .ok();
            tracing::debug!(status = status.as_u16(), "TMDB API error response");
            return Err(TmdbError::Api {
                status: status.as_u16(),
                status_text: String::from(status.canonical_reason().unwrap_or_default()),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| TmdbError::Decode {
            path: String::from(path),
            source,
        })
    }

    /// Fetches a list endpoint and returns its `results`.
    async fn fetch_results(
        &self,
        path: &str,
        opts: &RequestOptions,
    ) -> Result<Vec<Value>, TmdbError> {
        let envelope: ResultsEnvelope<Value> = self.fetch_as(path, &[], opts).await?;
        Ok(envelope.results)
    }

    /// Runs a filtered listing for the given media type.
    async fn filtered(
        &self,
        filters: &Filters,
        media: MediaType,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError> {
        let params = build_params_for(filters, media);
        let path = params.path(media);
        self.fetch_as(&path, params.pairs(), opts).await
    }
}

/// Decodes a cached or fresh response body into `T`.
fn decode<T: DeserializeOwned>(path: &str, data: &Value) -> Result<T, TmdbError> {
    T::deserialize(data).map_err(|source| TmdbError::Decode {
        path: String::from(path),
        source,
    })
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn trending(
        &self,
        media: MediaType,
        opts: &RequestOptions,
    ) -> Result<Vec<Value>, TmdbError> {
        self.fetch_results(&format!("trending/{media}/week"), opts)
            .await
    }

    #[instrument(skip_all)]
    async fn popular_movies(&self, opts: &RequestOptions) -> Result<Vec<Value>, TmdbError> {
        self.fetch_results("movie/popular", opts).await
    }

    #[instrument(skip_all)]
    async fn top_rated_movies(&self, opts: &RequestOptions) -> Result<Vec<Value>, TmdbError> {
        self.fetch_results("movie/top_rated", opts).await
    }

    #[instrument(skip_all)]
    async fn upcoming_movies(&self, opts: &RequestOptions) -> Result<Vec<Value>, TmdbError> {
        self.fetch_results("movie/upcoming", opts).await
    }

    #[instrument(skip_all)]
    async fn recommended(
        &self,
        media: MediaType,
        opts: &RequestOptions,
    ) -> Result<Vec<Value>, TmdbError> {
        let paged = self.filtered(&Filters::new(), media, opts).await?;
        Ok(paged.results)
    }

    #[instrument(skip_all)]
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError> {
        let params = [
            ("query", String::from(query)),
            ("page", page.max(1).to_string()),
            ("include_adult", String::from("false")),
        ];
        self.fetch_as("search/movie", &params, opts).await
    }

    #[instrument(skip_all)]
    async fn discover_movies(
        &self,
        filters: &Filters,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError> {
        self.filtered(filters, MediaType::Movie, opts).await
    }

    #[instrument(skip_all)]
    async fn discover_tv(
        &self,
        filters: &Filters,
        opts: &RequestOptions,
    ) -> Result<PagedResults, TmdbError> {
        self.filtered(filters, MediaType::Tv, opts).await
    }

    #[instrument(skip_all)]
    async fn details(
        &self,
        media: MediaType,
        id: u64,
        opts: &RequestOptions,
    ) -> Result<Value, TmdbError> {
        let path = format!("{media}/{id}");
        let params = [("append_to_response", String::from(DETAILS_APPEND))];
        self.fetch_json(&path, &params, opts).await
    }

    #[instrument(skip_all)]
    async fn genres(
        &self,
        media: MediaType,
        opts: &RequestOptions,
    ) -> Result<Vec<Genre>, TmdbError> {
        let path = format!("genre/{media}/list");
        let params = [("language", String::from(LANGUAGE))];
        let envelope: GenresEnvelope = self.fetch_as(&path, &params, opts).await?;
        Ok(envelope.genres)
    }

    #[instrument(skip_all)]
    async fn keywords(
        &self,
        query: &str,
        opts: &RequestOptions,
    ) -> Result<Vec<Keyword>, TmdbError> {
        let params = [("query", String::from(query))];
        let envelope: ResultsEnvelope<Keyword> =
            self.fetch_as("search/keyword", &params, opts).await?;
        Ok(envelope.results)
    }
}
