//! reelscout - movie and TV discovery CLI backed by TMDB.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};
use reelscout_api::tmdb::{
    Filters, LocalTmdbApi, MediaType, PagedResults, RequestOptions, TmdbClient, TmdbError,
};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Skip the response cache for every request.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// TMDB queries.
    #[command(flatten)]
    Tmdb(TmdbCommand),
    /// Configuration file operations.
    Config(ConfigCommand),
}

/// Subcommands that query TMDB.
#[derive(Subcommand)]
enum TmdbCommand {
    /// Fetch trending, popular, top-rated and upcoming lists at once.
    Overview,
    /// List this week's trending titles.
    Trending(MediaArgs),
    /// List popular movies.
    Popular,
    /// List top-rated movies.
    TopRated,
    /// List upcoming movies.
    Upcoming,
    /// List recommended titles (default discover listing).
    Recommended(MediaArgs),
    /// Search movies by title.
    Search(SearchArgs),
    /// Filter movies or TV series.
    Discover(DiscoverArgs),
    /// Show movie or TV details.
    Details(DetailsArgs),
    /// List genres.
    Genres(MediaArgs),
    /// Suggest keywords for a text fragment.
    Keywords(KeywordsArgs),
}

/// Fixed movie lists.
#[derive(Clone, Copy)]
enum MovieList {
    /// `movie/popular`
    Popular,
    /// `movie/top_rated`
    TopRated,
    /// `movie/upcoming`
    Upcoming,
}

/// Media type selector shared by several subcommands.
#[derive(clap::Args)]
struct MediaArgs {
    /// Media type: "movie" or "tv".
    #[arg(long, default_value = "movie")]
    media: MediaType,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "Dune").
    #[arg(long, required = true)]
    query: String,
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `discover` subcommand.
#[derive(clap::Args)]
struct DiscoverArgs {
    /// Media type: "movie" or "tv".
    #[arg(long, default_value = "movie")]
    media: MediaType,
    /// Genre ID(s), e.g. "28" or "28,12".
    #[arg(long)]
    genre: Option<String>,
    /// Primary release year.
    #[arg(long)]
    year: Option<String>,
    /// Minimum vote average.
    #[arg(long)]
    rating: Option<String>,
    /// Runtime bucket: "short", "medium" or "long" (movies only).
    #[arg(long)]
    duration: Option<String>,
    /// Sort key (default: "popularity.desc").
    #[arg(long)]
    sort_by: Option<String>,
    /// Free-text query.
    #[arg(long)]
    query: Option<String>,
    /// Result page.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// Media type: "movie" or "tv".
    #[arg(long, default_value = "movie")]
    media: MediaType,
    /// TMDB ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `keywords` subcommand.
#[derive(clap::Args)]
struct KeywordsArgs {
    /// Text fragment (e.g. "space").
    #[arg(long, required = true)]
    query: String,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration.
    Show,
    /// Write a default config file if none exists.
    Init,
}

impl DiscoverArgs {
    /// Converts CLI flags into `Filters`.
    fn to_filters(&self) -> Filters {
        let mut filters = Filters::new().page(self.page);
        if let Some(ref genre) = self.genre {
            filters = filters.genre(genre);
        }
        if let Some(ref year) = self.year {
            filters = filters.year(year);
        }
        if let Some(ref rating) = self.rating {
            filters = filters.rating(rating);
        }
        if let Some(ref duration) = self.duration {
            filters = filters.duration(duration);
        }
        if let Some(ref sort_by) = self.sort_by {
            filters = filters.sort_by(sort_by);
        }
        if let Some(ref query) = self.query {
            filters = filters.query(query);
        }
        filters
    }
}

/// Returns `title` (movies) or `name` (TV), or `-`.
fn item_title(item: &Value) -> &str {
    item.get("title")
        .or_else(|| item.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("-")
}

/// Returns `release_date` (movies) or `first_air_date` (TV), or `-`.
fn item_date(item: &Value) -> &str {
    item.get("release_date")
        .or_else(|| item.get("first_air_date"))
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .unwrap_or("-")
}

/// Formats an optional JSON field for table output.
fn field_or_dash(item: &Value, key: &str) -> String {
    item.get(key)
        .filter(|v| !v.is_null())
        .map_or_else(|| String::from("-"), ToString::to_string)
}

/// Logs a result list as a table.
fn log_results(results: &[Value]) {
    tracing::info!("ID\tTitle\t\t\tDate\t\tRating");
    for item in results {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            field_or_dash(item, "id"),
            item_title(item),
            item_date(item),
            field_or_dash(item, "vote_average"),
        );
    }
}

/// Logs a paginated result list.
fn log_paged(paged: &PagedResults, page: u32) {
    tracing::info!("Page {}/{}", page.max(1), paged.total_pages);
    log_results(&paged.results);
}

/// Returns `true` if the error chain contains a cancelled TMDB request.
fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<TmdbError>())
        .any(TmdbError::is_cancelled)
}

/// Per-run request options shared by every call of a subcommand.
fn request_options(no_cache: bool, cancel: CancellationToken) -> RequestOptions {
    RequestOptions::new()
        .bypass_cache(no_cache)
        .cancel_token(cancel)
}

/// Builds a `TmdbClient` from the config and the `TMDB_API_TOKEN` environment variable.
///
/// A missing token is reported by the first request.
///
/// # Errors
///
/// Returns an error if the configured base URL is invalid or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &AppConfig) -> Result<TmdbClient> {
    let mut builder = TmdbClient::builder()
        .api_token_from_env()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .cache_config(config.cache_config());
    if let Some(url) = config.base_url()? {
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build TMDB client")
}

/// Runs the `overview` subcommand.
///
/// # Errors
///
/// Returns an error if any of the list requests fails.
#[instrument(skip_all)]
async fn run_overview(client: &TmdbClient, opts: &RequestOptions) -> Result<()> {
    let (trending, popular, top_rated, upcoming) = futures::future::try_join4(
        client.trending(MediaType::Movie, opts),
        client.popular_movies(opts),
        client.top_rated_movies(opts),
        client.upcoming_movies(opts),
    )
    .await
    .context("TMDB overview requests failed")?;

    tracing::info!("Trending:  {}", trending.len());
    tracing::info!("Popular:   {}", popular.len());
    tracing::info!("Top rated: {}", top_rated.len());
    tracing::info!("Upcoming:  {}", upcoming.len());
    if let Some(top) = trending.first() {
        tracing::info!("Top trending: {} ({})", item_title(top), item_date(top));
    }

    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_trending(client: &TmdbClient, args: &MediaArgs, opts: &RequestOptions) -> Result<()> {
    let results = client
        .trending(args.media, opts)
        .await
        .context("TMDB trending request failed")?;
    log_results(&results);
    Ok(())
}

/// Runs one of the fixed movie list subcommands.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_movie_list(
    client: &TmdbClient,
    list: MovieList,
    opts: &RequestOptions,
) -> Result<()> {
    let results = match list {
        MovieList::Popular => client.popular_movies(opts).await,
        MovieList::TopRated => client.top_rated_movies(opts).await,
        MovieList::Upcoming => client.upcoming_movies(opts).await,
    }
    .context("TMDB movie list request failed")?;
    log_results(&results);
    Ok(())
}

/// Runs the `recommended` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_recommended(
    client: &TmdbClient,
    args: &MediaArgs,
    opts: &RequestOptions,
) -> Result<()> {
    let results = client
        .recommended(args.media, opts)
        .await
        .context("TMDB recommended request failed")?;
    log_results(&results);
    Ok(())
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_search(client: &TmdbClient, args: &SearchArgs, opts: &RequestOptions) -> Result<()> {
    let paged = client
        .search_movies(&args.query, args.page, opts)
        .await
        .context("TMDB search/movie request failed")?;
    log_paged(&paged, args.page);
    Ok(())
}

/// Runs the `discover` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_discover(
    client: &TmdbClient,
    args: &DiscoverArgs,
    opts: &RequestOptions,
) -> Result<()> {
    let filters = args.to_filters();
    let paged = match args.media {
        MediaType::Movie => client.discover_movies(&filters, opts).await,
        MediaType::Tv => client.discover_tv(&filters, opts).await,
    }
    .context("TMDB discover request failed")?;
    log_paged(&paged, args.page);
    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_details(client: &TmdbClient, args: &DetailsArgs, opts: &RequestOptions) -> Result<()> {
    let details = client
        .details(args.media, args.id, opts)
        .await
        .context("TMDB details request failed")?;

    tracing::info!("ID: {}", field_or_dash(&details, "id"));
    tracing::info!("Title: {}", item_title(&details));
    tracing::info!("Date: {}", item_date(&details));
    tracing::info!("Rating: {}", field_or_dash(&details, "vote_average"));
    let overview = details.get("overview").and_then(Value::as_str);
    if let Some(overview) = overview {
        tracing::info!("Overview: {overview}");
    }

    let cast = details
        .pointer("/credits/cast")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if !cast.is_empty() {
        tracing::info!("Cast:");
        for member in cast.iter().take(10) {
            let name = member.get("name").and_then(Value::as_str).unwrap_or("-");
            let character = member
                .get("character")
                .and_then(Value::as_str)
                .unwrap_or("-");
            tracing::info!("  {name} as {character}");
        }
    }

    for (label, pointer) in [
        ("Recommendations", "/recommendations/results"),
        ("Similar", "/similar/results"),
    ] {
        let items = details
            .pointer(pointer)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if !items.is_empty() {
            tracing::info!("{label}:");
            for item in items.iter().take(5) {
                tracing::info!("  {}\t{}", field_or_dash(item, "id"), item_title(item));
            }
        }
    }

    Ok(())
}

/// Runs the `genres` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_genres(client: &TmdbClient, args: &MediaArgs, opts: &RequestOptions) -> Result<()> {
    let genres = client
        .genres(args.media, opts)
        .await
        .context("TMDB genre list request failed")?;
    tracing::info!("ID\tName");
    for genre in &genres {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }
    Ok(())
}

/// Runs the `keywords` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_keywords(
    client: &TmdbClient,
    args: &KeywordsArgs,
    opts: &RequestOptions,
) -> Result<()> {
    let keywords = client
        .keywords(&args.query, opts)
        .await
        .context("TMDB search/keyword request failed")?;
    tracing::info!("ID\tKeyword");
    for keyword in &keywords {
        tracing::info!("{}\t{}", keyword.id, keyword.name);
    }
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or the file is invalid.
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    let config = AppConfig::load(&path)?;
    tracing::info!("# {}", path.display());
    tracing::info!("{}", config.to_toml()?);
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or the file cannot be written.
fn run_config_init(dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    if path.exists() {
        tracing::info!("Config already exists: {}", path.display());
        return Ok(());
    }
    AppConfig::default().save(&path)?;
    tracing::info!("Wrote default config: {}", path.display());
    Ok(())
}

/// Dispatches a TMDB-backed subcommand against a fresh client.
///
/// # Errors
///
/// Returns an error if config loading, client construction or the request fails.
async fn run_tmdb_command(
    dir: Option<&PathBuf>,
    no_cache: bool,
    command: &TmdbCommand,
) -> Result<()> {
    let path = resolve_config_path(dir)?;
    let config = AppConfig::load(&path)?;
    let client = build_tmdb_client(&config)?;
    let sweeper = client.start_sweeper();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });
    let opts = request_options(no_cache, cancel);

    let result = match *command {
        TmdbCommand::Overview => run_overview(&client, &opts).await,
        TmdbCommand::Trending(ref args) => run_trending(&client, args, &opts).await,
        TmdbCommand::Popular => run_movie_list(&client, MovieList::Popular, &opts).await,
        TmdbCommand::TopRated => run_movie_list(&client, MovieList::TopRated, &opts).await,
        TmdbCommand::Upcoming => run_movie_list(&client, MovieList::Upcoming, &opts).await,
        TmdbCommand::Recommended(ref args) => run_recommended(&client, args, &opts).await,
        TmdbCommand::Search(ref args) => run_search(&client, args, &opts).await,
        TmdbCommand::Discover(ref args) => run_discover(&client, args, &opts).await,
        TmdbCommand::Details(ref args) => run_details(&client, args, &opts).await,
        TmdbCommand::Genres(ref args) => run_genres(&client, args, &opts).await,
        TmdbCommand::Keywords(ref args) => run_keywords(&client, args, &opts).await,
    };

    tracing::debug!(entries = client.cache_len().await, "response cache size");
    sweeper.stop().await;
    result
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config(ref cmd) => match cmd.command {
            ConfigSubcommands::Show => run_config_show(cli.dir.as_ref()),
            ConfigSubcommands::Init => run_config_init(cli.dir.as_ref()),
        },
        Commands::Tmdb(ref cmd) => run_tmdb_command(cli.dir.as_ref(), cli.no_cache, cmd).await,
    };

    match result {
        Err(err) if is_cancelled(&err) => {
            tracing::info!("Cancelled");
            Ok(())
        }
        other => other,
    }
}
