//! In-memory stand-ins for the stores and the movie provider

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use movie_rec_api::{
    api::{create_router, AppState},
    db::{OAuthStateStore, PreferencesStore, UserStore, WatchHistoryStore},
    error::{AppError, AppResult},
    models::{
        Genre, GenreId, Movie, MovieDetails, MovieId, MoviePage, NewUser, NewWatchEntry,
        PreferencesUpdate, RatingSummary, Role, User, UserPreferences, UserUpdate,
        WatchHistoryEntry,
    },
    services::{
        providers::{tmdb, MovieProvider},
        GoogleOAuth, TokenIssuer,
    },
};

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const FRONTEND_URL: &str = "http://localhost:3000";

// ============================================================================
// Stores
// ============================================================================

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    fn find<F: Fn(&User) -> bool>(&self, predicate: F) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| predicate(u)).cloned()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUsers {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AppError::Conflict("Username or email already in use".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            google_id: new_user.google_id,
            role: new_user.role,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.id == id))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.email == email))
    }

    async fn find_by_google_id(&self, google_id: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.google_id.as_deref() == Some(google_id)))
    }

    async fn link_google_id(&self, id: Uuid, google_id: &str) -> AppResult<()> {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.google_id = Some(google_id.to_string());
        }
        Ok(())
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> AppResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = Some(hash);
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct InMemoryPreferences {
    preferences: Mutex<HashMap<Uuid, UserPreferences>>,
}

#[async_trait::async_trait]
impl PreferencesStore for InMemoryPreferences {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        Ok(self.preferences.lock().unwrap().get(&user_id).cloned())
    }

    async fn create_default(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        let mut preferences = self.preferences.lock().unwrap();
        Ok(preferences
            .entry(user_id)
            .or_insert_with(|| UserPreferences::defaults_for(user_id))
            .clone())
    }

    async fn upsert(&self, user_id: Uuid, update: PreferencesUpdate) -> AppResult<UserPreferences> {
        let mut preferences = self.preferences.lock().unwrap();
        let stored = preferences
            .entry(user_id)
            .or_insert_with(|| UserPreferences::defaults_for(user_id));
        stored.apply(update);
        Ok(stored.clone())
    }
}

#[derive(Default)]
pub struct InMemoryWatchHistory {
    entries: Mutex<Vec<WatchHistoryEntry>>,
}

#[async_trait::async_trait]
impl WatchHistoryStore for InMemoryWatchHistory {
    async fn append(&self, user_id: Uuid, entry: NewWatchEntry) -> AppResult<WatchHistoryEntry> {
        let stored = WatchHistoryEntry {
            id: Uuid::new_v4(),
            user_id,
            movie_id: entry.movie_id,
            movie_title: entry.movie_title,
            rating: entry.rating,
            watched_at: Utc::now(),
        };
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<WatchHistoryEntry>> {
        // Insertion order reversed is newest first
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_rating(&self, user_id: Uuid, entry_id: Uuid, rating: i32) -> AppResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.user_id == user_id)
        {
            Some(entry) => {
                entry.rating = Some(rating);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(entries.len() < before)
    }

    async fn rating_summary(&self, user_id: Uuid) -> AppResult<RatingSummary> {
        let ratings: Vec<i32> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| e.rating)
            .collect();

        let average = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
        };
        Ok(RatingSummary {
            average,
            count: ratings.len() as i64,
        })
    }
}

#[derive(Default)]
pub struct InMemoryStates {
    pub states: Mutex<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl OAuthStateStore for InMemoryStates {
    async fn save(&self, csrf_state: &str, pkce_verifier: &str, _ttl: u64) -> AppResult<()> {
        self.states
            .lock()
            .unwrap()
            .insert(csrf_state.to_string(), pkce_verifier.to_string());
        Ok(())
    }

    async fn take(&self, csrf_state: &str) -> AppResult<Option<String>> {
        Ok(self.states.lock().unwrap().remove(csrf_state))
    }
}

// ============================================================================
// Movie provider
// ============================================================================

pub fn movie(id: MovieId, vote_average: f64) -> Movie {
    Movie {
        id,
        title: format!("Movie {}", id),
        overview: Some("An overview".to_string()),
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: Some(format!("/backdrop{}.jpg", id)),
        release_date: Some("1999-03-31".to_string()),
        vote_average,
        vote_count: 1000,
        popularity: 50.0,
        genre_ids: vec![],
        original_language: Some("en".to_string()),
    }
}

fn page(results: Vec<Movie>) -> MoviePage {
    MoviePage {
        page: 1,
        total_pages: 1,
        total_results: results.len() as u32,
        results,
    }
}

/// Catalog served from memory. Genres listed in `failing_genres` answer
/// with an upstream error.
#[derive(Default)]
pub struct FakeProvider {
    pub genres: Vec<Genre>,
    pub by_genre: HashMap<GenreId, Vec<Movie>>,
    pub popular: Vec<Movie>,
    pub failing_genres: HashSet<GenreId>,
}

impl FakeProvider {
    pub fn standard() -> Self {
        let mut by_genre = HashMap::new();
        by_genre.insert(28, vec![movie(42, 8.1), movie(10, 7.5), movie(11, 6.9)]);
        by_genre.insert(35, vec![movie(20, 8.8)]);

        Self {
            genres: vec![
                Genre { id: 28, name: "Action".to_string() },
                Genre { id: 35, name: "Comedy".to_string() },
                Genre { id: 18, name: "Drama".to_string() },
            ],
            by_genre,
            popular: vec![movie(1, 6.5), movie(2, 5.9), movie(3, 8.0), movie(4, 6.0)],
            failing_genres: HashSet::new(),
        }
    }

    fn all_movies(&self) -> impl Iterator<Item = &Movie> {
        self.popular.iter().chain(self.by_genre.values().flatten())
    }
}

#[async_trait::async_trait]
impl MovieProvider for FakeProvider {
    async fn search_movies(&self, query: &str, _page: u32) -> AppResult<MoviePage> {
        let needle = query.to_lowercase();
        Ok(page(
            self.all_movies()
                .filter(|m| m.title.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        ))
    }

    async fn get_popular_movies(&self, _page: u32) -> AppResult<MoviePage> {
        Ok(page(self.popular.clone()))
    }

    async fn get_movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        let movie = self
            .all_movies()
            .find(|m| m.id == movie_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

        Ok(MovieDetails {
            movie,
            genres: self.genres.clone(),
            runtime: Some(136),
            tagline: Some("Welcome to the real world".to_string()),
            status: Some("Released".to_string()),
            imdb_id: None,
        })
    }

    async fn get_genres(&self) -> AppResult<Vec<Genre>> {
        Ok(self.genres.clone())
    }

    async fn get_movies_by_genre(&self, genre_id: GenreId, _page: u32) -> AppResult<MoviePage> {
        if self.failing_genres.contains(&genre_id) {
            return Err(AppError::Upstream("TMDB returned status 503".to_string()));
        }
        Ok(page(self.by_genre.get(&genre_id).cloned().unwrap_or_default()))
    }

    fn image_url(&self, path: &str) -> Option<String> {
        tmdb::image_url(IMAGE_BASE, path)
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub users: Arc<InMemoryUsers>,
    pub oauth_states: Arc<InMemoryStates>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(FakeProvider::standard(), false)
    }

    pub fn with_provider(provider: FakeProvider) -> Self {
        Self::build(provider, false)
    }

    pub fn with_google() -> Self {
        Self::build(FakeProvider::standard(), true)
    }

    fn build(provider: FakeProvider, google_enabled: bool) -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let oauth_states = Arc::new(InMemoryStates::default());

        let google = google_enabled.then(|| {
            GoogleOAuth::new(
                "client-id".to_string(),
                "client-secret".to_string(),
                "http://localhost:3000/api/auth/google/callback",
                oauth_states.clone(),
            )
            .unwrap()
        });

        let state = Arc::new(AppState::new(
            users.clone(),
            Arc::new(InMemoryPreferences::default()),
            Arc::new(InMemoryWatchHistory::default()),
            Arc::new(provider),
            TokenIssuer::new("integration-test-secret", 7),
            google,
            FRONTEND_URL,
        ));

        let server = TestServer::new(create_router(state.clone())).unwrap();

        Self {
            server,
            state,
            users,
            oauth_states,
        }
    }

    /// Registers an account and returns its token
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .server
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "secret123"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates an admin directly in the store and returns its token
    pub async fn admin_token(&self) -> String {
        let admin = self
            .users
            .create(NewUser {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: None,
                google_id: None,
                role: Role::Admin,
            })
            .await
            .unwrap();
        self.state.tokens.issue(&admin).unwrap()
    }
}

/// `Authorization` header value for a token
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}
