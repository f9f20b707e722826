use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::{AppJson, AuthUser},
    models::{NewUser, Role, User, UserProfile},
    services::{auth, oauth},
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterRequest {
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

/// Emails are matched case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let request = request.normalized();
    request.validate()?;

    if state.users.find_by_email(&request.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }
    if state.users.find_by_username(&request.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = auth::hash_password(&request.password).await?;
    let user = state
        .users
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash: Some(password_hash),
            google_id: None,
            role: Role::User,
        })
        .await?;
    state.preferences.create_default(user.id).await?;

    let response = auth_response(&state, &user, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    // Accounts created through Google have no password to check
    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !auth::verify_password(&request.password, password_hash).await? {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(auth_response(&state, &user, "Login successful")?))
}

/// GET /api/auth/me
pub async fn me(
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

/// GET /api/auth/google
pub async fn google_login(State(state): State<Arc<AppState>>) -> AppResult<Redirect> {
    let google = google_client(&state)?;
    let url = google.authorize_url().await?;
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /api/auth/google/callback
///
/// Always ends in a redirect to the frontend; failures are reported through
/// the `error` query parameter rather than an error status.
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GoogleCallbackParams>,
) -> AppResult<Redirect> {
    let google = google_client(&state)?;

    let outcome = match (params.error, params.code, params.state) {
        (Some(error), _, _) => Err(AppError::Unauthorized(format!("Google denied sign-in: {}", error))),
        (None, Some(code), Some(csrf_state)) => match google.complete(&code, &csrf_state).await {
            Ok(profile) => {
                oauth::resolve_account(state.users.as_ref(), state.preferences.as_ref(), &profile)
                    .await
            }
            Err(e) => Err(e),
        },
        _ => Err(AppError::InvalidInput("Missing code or state".to_string())),
    };

    let target = match outcome.and_then(|user| state.tokens.issue(&user).map(|token| (token, user))) {
        Ok((token, user)) => {
            tracing::info!(user_id = %user.id, "Google sign-in completed");
            frontend_redirect(
                &state.frontend_url,
                &[("token", token.as_str()), ("username", user.username.as_str())],
            )?
        }
        Err(e) => {
            tracing::warn!(error = %e, "Google sign-in failed");
            frontend_redirect(&state.frontend_url, &[("error", "google_auth_failed")])?
        }
    };

    Ok(Redirect::to(&target))
}

fn google_client(state: &AppState) -> AppResult<&oauth::GoogleOAuth> {
    state
        .google
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Google sign-in is not configured".to_string()))
}

fn auth_response(state: &AppState, user: &User, message: &str) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        message: message.to_string(),
        token: state.tokens.issue(user)?,
        user: UserProfile::from(user),
    })
}

/// `{frontend}/?k=v&...` with the values percent-encoded
fn frontend_redirect(frontend_url: &str, params: &[(&str, &str)]) -> AppResult<String> {
    let mut url = reqwest::Url::parse(&format!("{}/", frontend_url))
        .map_err(|e| AppError::Internal(format!("Invalid frontend URL: {}", e)))?;
    url.query_pairs_mut().extend_pairs(params.iter());
    Ok(url.to_string())
}
