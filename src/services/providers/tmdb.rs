//! TMDB (The Movie Database) provider
//!
//! Wraps the v3 REST API. Every call is a plain GET authenticated with the
//! `api_key` query parameter; nothing is cached.
//!
//! Endpoints used:
//! - /search/movie, /movie/popular, /discover/movie → paginated listings
//! - /movie/{id} → details
//! - /genre/movie/list → genre id/name table
use crate::{
    error::{AppError, AppResult},
    models::{Genre, GenreId, MovieDetails, MovieId, MoviePage},
    services::providers::MovieProvider,
};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

const PROVIDER: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, image_base: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!(provider = PROVIDER, "TMDB API key is empty; movie features will fail");
        }

        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_base,
        }
    }

    /// Sends a GET request without interpreting the status
    async fn request(&self, path: &str, params: &[(&str, String)]) -> AppResult<Response> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the api_key query parameter
                let e = e.without_url();
                tracing::error!(error = %e, path = %path, provider = PROVIDER, "TMDB request failed");
                AppError::HttpClient(e)
            })?;

        Ok(response)
    }

    /// Checks the status and decodes the JSON body
    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> AppResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                provider = PROVIDER,
                "TMDB returned an error status"
            );
            return Err(AppError::Upstream(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;
        tracing::debug!(path = %path, response = %response_text, "Raw TMDB response");

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, path = %path, provider = PROVIDER, "Failed to deserialize TMDB response");
            AppError::Upstream(format!("Failed to parse TMDB response: {}", e))
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self.request(path, params).await?;
        Self::decode(path, response).await
    }
}

fn validate_page(page: u32) -> AppResult<()> {
    if page == 0 {
        return Err(AppError::InvalidInput(
            "Page numbers start at 1".to_string(),
        ));
    }
    Ok(())
}

/// Joins an image base and a relative path; `None` for an empty path
pub fn image_url(base: &str, path: &str) -> Option<String> {
    if path.trim().is_empty() {
        return None;
    }
    Some(format!("{}{}", base, path))
}

#[async_trait::async_trait]
impl MovieProvider for TmdbProvider {
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<MoviePage> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query required".to_string(),
            ));
        }
        validate_page(page)?;

        let results: MoviePage = self
            .get_json(
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
            )
            .await?;

        tracing::info!(
            query = %query,
            page = page,
            results = results.results.len(),
            provider = PROVIDER,
            "Movie search completed"
        );

        Ok(results)
    }

    async fn get_popular_movies(&self, page: u32) -> AppResult<MoviePage> {
        validate_page(page)?;
        self.get_json("/movie/popular", &[("page", page.to_string())])
            .await
    }

    async fn get_movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        let path = format!("/movie/{}", movie_id);
        let response = self.request(&path, &[]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Movie {}", movie_id)));
        }

        Self::decode(&path, response).await
    }

    async fn get_genres(&self) -> AppResult<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreListResponse {
            genres: Vec<Genre>,
        }

        let response: GenreListResponse = self.get_json("/genre/movie/list", &[]).await?;
        Ok(response.genres)
    }

    async fn get_movies_by_genre(&self, genre_id: GenreId, page: u32) -> AppResult<MoviePage> {
        validate_page(page)?;
        self.get_json(
            "/discover/movie",
            &[("with_genres", genre_id.to_string()), ("page", page.to_string())],
        )
        .await
    }

    fn image_url(&self, path: &str) -> Option<String> {
        image_url(&self.image_base, path)
    }
}
