use std::sync::Arc;

use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::{
    db::{OAuthStateStore, PreferencesStore, UserStore},
    error::{AppError, AppResult},
    models::{NewUser, Role, User},
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Seconds an authorization may stay pending
pub const STATE_TTL_SECS: u64 = 600;

/// The part of Google's userinfo response we use
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Google sign-in through the authorization-code flow with PKCE
#[derive(Clone)]
pub struct GoogleOAuth {
    client: BasicClient,
    states: Arc<dyn OAuthStateStore>,
    http_client: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(
        client_id: String,
        client_secret: String,
        callback_url: &str,
        states: Arc<dyn OAuthStateStore>,
    ) -> AppResult<Self> {
        let client = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                .map_err(|e| AppError::Internal(e.to_string()))?,
            Some(
                TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
                    .map_err(|e| AppError::Internal(e.to_string()))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(callback_url.to_string())
                .map_err(|e| AppError::Internal(format!("Invalid Google callback URL: {}", e)))?,
        );

        Ok(Self {
            client,
            states,
            http_client: reqwest::Client::new(),
        })
    }

    /// Starts a sign-in: remembers the PKCE verifier under a fresh CSRF state
    /// and returns the Google consent URL
    pub async fn authorize_url(&self) -> AppResult<String> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        self.states
            .save(csrf_token.secret(), pkce_verifier.secret(), STATE_TTL_SECS)
            .await?;

        tracing::debug!("Google authorization URL generated");

        Ok(auth_url.to_string())
    }

    /// Redeems the callback's code and returns the signed-in Google profile.
    ///
    /// The state is consumed whether or not the exchange succeeds.
    pub async fn complete(&self, code: &str, state: &str) -> AppResult<GoogleProfile> {
        let verifier = self
            .states
            .take(state)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown or expired OAuth state".to_string()))?;

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(async_http_client)
            .await
            .map_err(|e| AppError::Upstream(format!("Google token exchange failed: {}", e)))?;

        let response = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Google userinfo returned status {}",
                response.status()
            )));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Google profile: {}", e)))
    }
}

/// Finds or creates the local account for a Google profile.
///
/// Lookup order: Google id, then email (linking the Google id), then a new
/// password-less account with a unique username and default preferences.
pub async fn resolve_account(
    users: &dyn UserStore,
    preferences: &dyn PreferencesStore,
    profile: &GoogleProfile,
) -> AppResult<User> {
    if let Some(user) = users.find_by_google_id(&profile.id).await? {
        return Ok(user);
    }

    if let Some(mut user) = users.find_by_email(&profile.email).await? {
        users.link_google_id(user.id, &profile.id).await?;
        tracing::info!(user_id = %user.id, "Linked Google account to existing user");
        user.google_id = Some(profile.id.clone());
        return Ok(user);
    }

    let username = unique_username(users, &base_username(profile)).await?;
    let user = users
        .create(NewUser {
            username,
            email: profile.email.clone(),
            password_hash: None,
            google_id: Some(profile.id.clone()),
            role: Role::User,
        })
        .await?;
    preferences.create_default(user.id).await?;

    Ok(user)
}

/// Display name, or the local part of the email when the name is blank
fn base_username(profile: &GoogleProfile) -> String {
    profile
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| profile.email.split('@').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("user")
        .to_string()
}

/// `base`, or `base` with the smallest numeric suffix that is free
async fn unique_username(users: &dyn UserStore, base: &str) -> AppResult<String> {
    let mut candidate = base.to_string();
    let mut counter = 1u32;
    while users.find_by_username(&candidate).await?.is_some() {
        candidate = format!("{}{}", base, counter);
        counter += 1;
    }
    Ok(candidate)
}
