use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    models::{MovieDetailsResponse, MovieId, MovieListResponse, MoviePage, MovieWithPoster},
    services::providers::{optional_image_url, MovieProvider},
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

/// Attaches poster URLs to every movie of a provider page
pub fn list_response(provider: &dyn MovieProvider, page: MoviePage) -> MovieListResponse {
    let movies = page
        .results
        .into_iter()
        .map(|movie| {
            let poster_url = optional_image_url(provider, movie.poster_path.as_deref());
            MovieWithPoster { movie, poster_url }
        })
        .collect();

    MovieListResponse {
        movies,
        page: page.page,
        total_pages: page.total_pages,
        total_results: page.total_results,
    }
}

/// GET /api/movies/search?query=&page=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<MovieListResponse>> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Search query required".to_string()))?;

    tracing::debug!(query = %query, "Searching movies");

    let page = state
        .movies
        .search_movies(query, params.page.unwrap_or(1))
        .await?;
    Ok(Json(list_response(state.movies.as_ref(), page)))
}

/// GET /api/movies/popular?page=
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<MovieListResponse>> {
    let page = state
        .movies
        .get_popular_movies(params.page.unwrap_or(1))
        .await?;
    Ok(Json(list_response(state.movies.as_ref(), page)))
}

/// GET /api/movies/genres/list
pub async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let genres = state.movies.get_genres().await?;
    Ok(Json(json!({ "genres": genres })))
}

/// GET /api/movies/:id
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<MovieDetailsResponse>> {
    let details = state.movies.get_movie_details(movie_id).await?;
    let provider = state.movies.as_ref();

    Ok(Json(MovieDetailsResponse {
        poster_url: optional_image_url(provider, details.movie.poster_path.as_deref()),
        backdrop_url: optional_image_url(provider, details.movie.backdrop_path.as_deref()),
        details,
    }))
}
