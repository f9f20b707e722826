use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{api::AppState, error::AppResult, middleware::AuthUser, models::MovieWithPoster};

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<MovieWithPoster>,
}

/// GET /api/recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<RecommendationsResponse>> {
    let recommendations = state.recommender.get_recommendations(user.id).await?;
    Ok(Json(RecommendationsResponse { recommendations }))
}
