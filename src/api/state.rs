use std::sync::Arc;

use crate::{
    db::{PreferencesStore, UserStore, WatchHistoryStore},
    services::{providers::MovieProvider, GoogleOAuth, RecommendationSelector, TokenIssuer},
};

/// Shared application state
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub preferences: Arc<dyn PreferencesStore>,
    pub watch_history: Arc<dyn WatchHistoryStore>,
    pub movies: Arc<dyn MovieProvider>,
    pub recommender: RecommendationSelector,
    pub tokens: TokenIssuer,
    /// `None` when Google sign-in is not configured
    pub google: Option<GoogleOAuth>,
    /// Where OAuth callbacks send the browser afterwards
    pub frontend_url: String,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        preferences: Arc<dyn PreferencesStore>,
        watch_history: Arc<dyn WatchHistoryStore>,
        movies: Arc<dyn MovieProvider>,
        tokens: TokenIssuer,
        google: Option<GoogleOAuth>,
        frontend_url: impl Into<String>,
    ) -> Self {
        let recommender = RecommendationSelector::new(
            Arc::clone(&preferences),
            Arc::clone(&watch_history),
            Arc::clone(&movies),
        );

        Self {
            users,
            preferences,
            watch_history,
            movies,
            recommender,
            tokens,
            google,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }
}
