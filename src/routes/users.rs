use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::{AdminUser, AppJson, AuthUser},
    models::{
        watch_history::is_valid_rating, MovieId, NewWatchEntry, PreferencesUpdate, UserPreferences,
        UserProfile, UserUpdate, WatchHistoryEntry,
    },
    routes::auth::normalize_email,
    services::auth,
};

const RATING_ERROR: &str = "Rating must be between 1 and 10";

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
    pub message: String,
    pub user: UserProfile,
}

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserProfile>> {
    let user = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserProfile::from(&user)))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ProfileUpdated>> {
    let request = UpdateProfileRequest {
        username: request.username.map(|u| u.trim().to_string()),
        email: request.email.as_deref().map(normalize_email),
        password: request.password,
    };
    request.validate()?;

    if let Some(username) = &request.username {
        if let Some(other) = state.users.find_by_username(username).await? {
            if other.id != user.id {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
        }
    }
    if let Some(email) = &request.email {
        if let Some(other) = state.users.find_by_email(email).await? {
            if other.id != user.id {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }
    }

    let password_hash = match &request.password {
        Some(password) => Some(auth::hash_password(password).await?),
        None => None,
    };

    let update = UserUpdate {
        username: request.username,
        email: request.email,
        password_hash,
    };
    if update.is_empty() {
        return Err(AppError::InvalidInput("No profile fields to update".to_string()));
    }

    let updated = state
        .users
        .update(user.id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %updated.id, "Profile updated");

    Ok(Json(ProfileUpdated {
        message: "Profile updated successfully".to_string(),
        user: UserProfile::from(&updated),
    }))
}

/// DELETE /api/users/profile
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    if !state.users.delete(user.id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user.id, "Account deleted");
    Ok(Json(json!({ "message": "Account deleted successfully" })))
}

// ============================================================================
// Preferences
// ============================================================================

/// GET /api/users/preferences
///
/// Accounts that predate preferences get the defaults on first read.
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserPreferences>> {
    let preferences = match state.preferences.find_by_user(user.id).await? {
        Some(preferences) => preferences,
        None => state.preferences.create_default(user.id).await?,
    };
    Ok(Json(preferences))
}

/// PUT /api/users/preferences
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(update): AppJson<PreferencesUpdate>,
) -> AppResult<Json<Value>> {
    if let Some(min_rating) = update.min_rating {
        if !(0.0..=10.0).contains(&min_rating) {
            return Err(AppError::InvalidInput(
                "Minimum rating must be between 0 and 10".to_string(),
            ));
        }
    }

    let preferences = state.preferences.upsert(user.id, update).await?;
    Ok(Json(json!({
        "message": "Preferences updated successfully",
        "preferences": preferences,
    })))
}

// ============================================================================
// Watch history
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchRequest {
    pub movie_id: Option<MovieId>,
    pub movie_title: Option<String>,
    pub rating: Option<i32>,
}

impl AddWatchRequest {
    fn into_entry(self) -> AppResult<NewWatchEntry> {
        let movie_id = self
            .movie_id
            .ok_or_else(|| AppError::InvalidInput("Movie ID is required".to_string()))?;
        let movie_title = self
            .movie_title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Movie title is required".to_string()))?;

        if let Some(rating) = self.rating {
            if !is_valid_rating(rating) {
                return Err(AppError::InvalidInput(RATING_ERROR.to_string()));
            }
        }

        Ok(NewWatchEntry {
            movie_id,
            movie_title,
            rating: self.rating,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct WatchEntryAdded {
    pub message: String,
    pub history_item: WatchHistoryEntry,
}

/// GET /api/users/watch-history
pub async fn get_watch_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<WatchHistoryEntry>>> {
    Ok(Json(state.watch_history.list_by_user(user.id).await?))
}

/// POST /api/users/watch-history
pub async fn add_watch_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(request): AppJson<AddWatchRequest>,
) -> AppResult<(StatusCode, Json<WatchEntryAdded>)> {
    let entry = request.into_entry()?;
    let history_item = state.watch_history.append(user.id, entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(WatchEntryAdded {
            message: "Added to watch history".to_string(),
            history_item,
        }),
    ))
}

/// PUT /api/users/watch-history/:id
pub async fn update_watch_rating(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(entry_id): Path<Uuid>,
    AppJson(request): AppJson<RatingRequest>,
) -> AppResult<Json<Value>> {
    let rating = request
        .rating
        .filter(|&r| is_valid_rating(r))
        .ok_or_else(|| AppError::InvalidInput(RATING_ERROR.to_string()))?;

    if !state
        .watch_history
        .update_rating(user.id, entry_id, rating)
        .await?
    {
        return Err(AppError::NotFound("Watch history entry not found".to_string()));
    }

    Ok(Json(json!({ "message": "Rating updated successfully" })))
}

/// DELETE /api/users/watch-history/:id
pub async fn delete_watch_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !state.watch_history.delete(user.id, entry_id).await? {
        return Err(AppError::NotFound("Watch history entry not found".to_string()));
    }

    Ok(Json(json!({ "message": "Removed from watch history" })))
}

// ============================================================================
// Stats & admin
// ============================================================================

#[derive(Debug, Serialize, PartialEq)]
pub struct UserStats {
    pub total_watched: usize,
    /// 0 when nothing has been rated
    pub average_rating: f64,
    pub rated_count: i64,
}

/// GET /api/users/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserStats>> {
    let history = state.watch_history.list_by_user(user.id).await?;
    let summary = state.watch_history.rating_summary(user.id).await?;

    Ok(Json(UserStats {
        total_watched: history.len(),
        average_rating: summary.average.unwrap_or(0.0),
        rated_count: summary.count,
    }))
}

/// GET /api/users/all
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    let users = state.users.list().await?;
    tracing::debug!(admin_id = %admin.id, count = users.len(), "Listing users");
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}
