use serde::{Deserialize, Serialize};

pub mod user;
pub mod user_preferences;
pub mod watch_history;

pub use user::{NewUser, Role, User, UserProfile, UserUpdate};
pub use user_preferences::{PreferencesUpdate, UserPreferences, DEFAULT_MIN_RATING};
pub use watch_history::{NewWatchEntry, RatingSummary, WatchHistoryEntry};

/// Movie identifier in the metadata provider's numbering
pub type MovieId = i64;

/// Genre identifier in the metadata provider's numbering
pub type GenreId = i64;

// ============================================================================
// TMDB API Types
// ============================================================================

/// A movie as listed by the metadata provider (search, popular, discover)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    /// Relative image path, not a URL
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub original_language: Option<String>,
}

/// One page of a paginated movie listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoviePage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

/// Genre as named by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Single movie with the extended fields of the details endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A movie augmented with a displayable poster URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieWithPoster {
    #[serde(flatten)]
    pub movie: Movie,
    pub poster_url: Option<String>,
}

/// Movie details augmented with displayable image URLs
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetailsResponse {
    #[serde(flatten)]
    pub details: MovieDetails,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

/// Paginated listing returned by the search and popular endpoints
#[derive(Debug, Clone, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<MovieWithPoster>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
}
