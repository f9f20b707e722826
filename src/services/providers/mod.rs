//! Movie metadata provider abstraction
//!
//! The catalog, genre list and discovery listings all come from an external
//! metadata service. Handlers and the recommender only see this trait, so the
//! concrete client is injected at startup and replaced by a fake in tests.
use crate::{
    error::AppResult,
    models::{Genre, GenreId, MovieDetails, MovieId, MoviePage},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Read-only access to an external movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Search movies by title
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<MoviePage>;

    /// Globally popular movies
    async fn get_popular_movies(&self, page: u32) -> AppResult<MoviePage>;

    /// Single movie with extended fields (genres, backdrop, runtime)
    async fn get_movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails>;

    /// Every genre the provider knows, with its numeric id
    async fn get_genres(&self) -> AppResult<Vec<Genre>>;

    /// Movies discoverable under one genre
    async fn get_movies_by_genre(&self, genre_id: GenreId, page: u32) -> AppResult<MoviePage>;

    /// Absolute URL for a relative image path. Deterministic; `None` for an
    /// empty path.
    fn image_url(&self, path: &str) -> Option<String>;
}

/// Convenience over [`MovieProvider::image_url`] for optional paths
pub fn optional_image_url(provider: &dyn MovieProvider, path: Option<&str>) -> Option<String> {
    path.and_then(|p| provider.image_url(p))
}
