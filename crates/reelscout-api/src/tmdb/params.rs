//! Discover/search filter types and query parameter construction.

use super::types::MediaType;

/// Default `sort_by` value for discover requests.
const DEFAULT_SORT_BY: &str = "popularity.desc";

/// Fixed response language.
pub(crate) const LANGUAGE: &str = "en-US";

/// Runtime boundary between short and medium movies (minutes).
const SHORT_MAX_RUNTIME: &str = "90";

/// Runtime boundary between medium and long movies (minutes).
const LONG_MIN_RUNTIME: &str = "120";

/// Runtime bucket selected in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBucket {
    /// Up to 90 minutes.
    Short,
    /// 90 to 120 minutes.
    Medium,
    /// 120 minutes and longer.
    Long,
}

impl DurationBucket {
    /// Parses a bucket name. Unknown values yield `None` (no runtime filter).
    #[must_use]
    pub fn from_filter_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            _ => None,
        }
    }

    /// Returns the `(with_runtime.gte, with_runtime.lte)` bounds.
    const fn runtime_bounds(self) -> (Option<&'static str>, Option<&'static str>) {
        match self {
            Self::Short => (None, Some(SHORT_MAX_RUNTIME)),
            Self::Medium => (Some(SHORT_MAX_RUNTIME), Some(LONG_MIN_RUNTIME)),
            Self::Long => (Some(LONG_MIN_RUNTIME), None),
        }
    }
}

/// Filter state for discover/search listings.
///
/// Fields hold the raw values the user entered. Blank or unparseable values
/// are dropped when the query is built, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    /// Genre ID(s), e.g. `"28"` or `"28,12"`.
    pub genre: Option<String>,
    /// Primary release year.
    pub year: Option<String>,
    /// Minimum vote average.
    pub rating: Option<String>,
    /// Runtime bucket.
    pub duration: Option<DurationBucket>,
    /// Sort key (default: `popularity.desc`).
    pub sort_by: Option<String>,
    /// Free-text query.
    pub query: Option<String>,
    /// Result page (default: 1).
    pub page: u32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            genre: None,
            year: None,
            rating: None,
            duration: None,
            sort_by: None,
            query: None,
            page: 1,
        }
    }
}

impl Filters {
    /// Creates empty filters (page 1).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the genre filter.
    #[must_use]
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Sets the release year filter.
    #[must_use]
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Sets the minimum rating filter.
    #[must_use]
    pub fn rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    /// Sets the runtime bucket from its name; unknown names clear it.
    #[must_use]
    pub fn duration(mut self, duration: &str) -> Self {
        self.duration = DurationBucket::from_filter_value(duration);
        self
    }

    /// Sets the sort key.
    #[must_use]
    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    /// Sets the free-text query.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Endpoint family selected by the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// `search/{media}` with `query`.
    Search,
    /// `discover/{media}` with structural filters.
    Discover,
}

/// Ordered query parameters produced from `Filters`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    /// Selected endpoint family.
    mode: QueryMode,
    /// Parameters in emission order.
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Returns the selected endpoint family.
    #[must_use]
    pub const fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Returns the parameters in emission order.
    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Looks up a parameter value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the endpoint path for the given media type.
    #[must_use]
    pub fn path(&self, media: MediaType) -> String {
        match self.mode {
            QueryMode::Search => format!("search/{media}"),
            QueryMode::Discover => format!("discover/{media}"),
        }
    }
}

/// Returns the trimmed value, or `None` if missing or blank.
fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Builds movie query parameters from filters.
#[must_use]
pub fn build_params(filters: &Filters) -> QueryParams {
    build_params_for(filters, MediaType::Movie)
}

/// Builds query parameters for the given media type.
///
/// Search mode is chosen when a query is present and genre, year and rating
/// are all absent; otherwise discover mode is used and the query becomes
/// `with_keywords`. Runtime buckets only apply to movies.
#[must_use]
pub fn build_params_for(filters: &Filters, media: MediaType) -> QueryParams {
    let genre = non_blank(filters.genre.as_ref());
    let year = non_blank(filters.year.as_ref()).filter(|y| y.parse::<u32>().is_ok());
    let rating = non_blank(filters.rating.as_ref())
        .filter(|r| r.parse::<f64>().is_ok_and(f64::is_finite));
    let query = non_blank(filters.query.as_ref());
    let sort_by = non_blank(filters.sort_by.as_ref()).unwrap_or(DEFAULT_SORT_BY);
    let page = filters.page.max(1);

    let mode = if query.is_some() && genre.is_none() && year.is_none() && rating.is_none() {
        QueryMode::Search
    } else {
        QueryMode::Discover
    };

    let mut pairs: Vec<(&'static str, String)> = vec![
        ("sort_by", String::from(sort_by)),
        ("page", page.to_string()),
        ("include_adult", String::from("false")),
        ("language", String::from(LANGUAGE)),
    ];

    if let Some(genre) = genre {
        pairs.push(("with_genres", String::from(genre)));
    }
    if let Some(year) = year {
        pairs.push(("primary_release_year", String::from(year)));
    }
    if let Some(rating) = rating {
        pairs.push(("vote_average.gte", String::from(rating)));
    }
    if let Some(query) = query {
        let key = match mode {
            QueryMode::Search => "query",
            QueryMode::Discover => "with_keywords",
        };
        pairs.push((key, String::from(query)));
    }

    if media == MediaType::Movie
        && let Some(bucket) = filters.duration
    {
        let (gte, lte) = bucket.runtime_bounds();
        if let Some(gte) = gte {
            pairs.push(("with_runtime.gte", String::from(gte)));
        }
        if let Some(lte) = lte {
            pairs.push(("with_runtime.lte", String::from(lte)));
        }
    }

    QueryParams { mode, pairs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Arrange & Act
        let params = build_params(&Filters::new());

        // Assert
        assert_eq!(params.mode(), QueryMode::Discover);
        assert_eq!(
            params.pairs(),
            &[
                ("sort_by", String::from("popularity.desc")),
                ("page", String::from("1")),
                ("include_adult", String::from("false")),
                ("language", String::from("en-US")),
            ]
        );
    }

    #[test]
    fn test_genre_and_medium_duration() {
        // Arrange
        let filters = Filters::new().genre("5").duration("medium");

        // Act
        let params = build_params(&filters);

        // Assert
        assert_eq!(params.get("with_genres"), Some("5"));
        assert_eq!(params.get("with_runtime.gte"), Some("90"));
        assert_eq!(params.get("with_runtime.lte"), Some("120"));
        assert_eq!(params.get("sort_by"), Some("popularity.desc"));
    }

    #[test]
    fn test_short_and_long_duration() {
        // Arrange
        let short = Filters::new().duration("short");
        let long = Filters::new().duration("long");

        // Act
        let short_params = build_params(&short);
        let long_params = build_params(&long);

        // Assert
        assert_eq!(short_params.get("with_runtime.lte"), Some("90"));
        assert_eq!(short_params.get("with_runtime.gte"), None);
        assert_eq!(long_params.get("with_runtime.gte"), Some("120"));
        assert_eq!(long_params.get("with_runtime.lte"), None);
    }

    #[test]
    fn test_unknown_duration_has_no_runtime() {
        // Arrange
        let filters = Filters::new().duration("epic");

        // Act
        let params = build_params(&filters);

        // Assert
        assert!(filters.duration.is_none());
        assert_eq!(params.get("with_runtime.gte"), None);
        assert_eq!(params.get("with_runtime.lte"), None);
    }

    #[test]
    fn test_query_alone_selects_search() {
        // Arrange
        let filters = Filters::new().query("dune");

        // Act
        let params = build_params(&filters);

        // Assert
        assert_eq!(params.mode(), QueryMode::Search);
        assert_eq!(params.get("query"), Some("dune"));
        assert_eq!(params.get("with_keywords"), None);
        assert_eq!(params.path(MediaType::Movie), "search/movie");
    }

    #[test]
    fn test_query_with_genre_selects_discover() {
        // Arrange
        let filters = Filters::new().query("dune").genre("5");

        // Act
        let params = build_params(&filters);

        // Assert
        assert_eq!(params.mode(), QueryMode::Discover);
        assert_eq!(params.get("with_keywords"), Some("dune"));
        assert_eq!(params.get("query"), None);
        assert_eq!(params.path(MediaType::Movie), "discover/movie");
    }

    #[test]
    fn test_query_with_year_or_rating_selects_discover() {
        // Arrange
        let with_year = Filters::new().query("dune").year("2021");
        let with_rating = Filters::new().query("dune").rating("7.5");

        // Act & Assert
        assert_eq!(build_params(&with_year).mode(), QueryMode::Discover);
        assert_eq!(
            build_params(&with_year).get("primary_release_year"),
            Some("2021")
        );
        assert_eq!(build_params(&with_rating).mode(), QueryMode::Discover);
        assert_eq!(
            build_params(&with_rating).get("vote_average.gte"),
            Some("7.5")
        );
    }

    #[test]
    fn test_malformed_fields_are_omitted() {
        // Arrange
        let filters = Filters::new()
            .genre("   ")
            .year("twenty")
            .rating("NaN")
            .sort_by("")
            .query("dune")
            .page(0);

        // Act
        let params = build_params(&filters);

        // Assert
        assert_eq!(params.get("with_genres"), None);
        assert_eq!(params.get("primary_release_year"), None);
        assert_eq!(params.get("vote_average.gte"), None);
        assert_eq!(params.get("sort_by"), Some("popularity.desc"));
        assert_eq!(params.get("page"), Some("1"));
        // Malformed structural filters do not force discover mode.
        assert_eq!(params.mode(), QueryMode::Search);
    }

    #[test]
    fn test_blank_query_is_absent() {
        // Arrange
        let filters = Filters::new().query("  ");

        // Act
        let params = build_params(&filters);

        // Assert
        assert_eq!(params.mode(), QueryMode::Discover);
        assert_eq!(params.get("with_keywords"), None);
    }

    #[test]
    fn test_tv_ignores_duration() {
        // Arrange
        let filters = Filters::new().genre("18").duration("short");

        // Act
        let params = build_params_for(&filters, MediaType::Tv);

        // Assert
        assert_eq!(params.get("with_runtime.lte"), None);
        assert_eq!(params.path(MediaType::Tv), "discover/tv");
    }

    #[test]
    fn test_parameter_order_is_fixed() {
        // Arrange
        let a = Filters::new().rating("6").genre("28").year("1999");
        let b = Filters::new().year("1999").genre("28").rating("6");

        // Act & Assert
        assert_eq!(build_params(&a), build_params(&b));
    }
}
