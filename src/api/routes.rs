use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};
use crate::routes::{self, auth, movies, recommendations, users};

/// Creates the API router with all routes under `/api`
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            // The request id must be assigned before the trace span is built
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(routes::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        // Movie catalog
        .route("/movies/search", get(movies::search))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/genres/list", get(movies::genres))
        .route("/movies/:id", get(movies::details))
        // Account data
        .route(
            "/users/profile",
            get(users::get_profile)
                .put(users::update_profile)
                .delete(users::delete_profile),
        )
        .route(
            "/users/preferences",
            get(users::get_preferences).put(users::update_preferences),
        )
        .route(
            "/users/watch-history",
            get(users::get_watch_history).post(users::add_watch_history),
        )
        .route(
            "/users/watch-history/:id",
            put(users::update_watch_rating).delete(users::delete_watch_history),
        )
        .route("/users/stats", get(users::stats))
        .route("/users/all", get(users::list_users))
        // Recommendations
        .route("/recommendations", get(recommendations::recommend))
}
