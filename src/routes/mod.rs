use axum::Json;
use serde_json::{json, Value};

pub mod auth;
pub mod movies;
pub mod recommendations;
pub mod users;

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Movie recommendation API is running"
    }))
}
