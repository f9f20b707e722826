use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Pending Google sign-in, keyed by its CSRF state token
    OAuthState(String),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::OAuthState(state) => write!(f, "oauth_state:{}", state),
        }
    }
}

/// Creates a Redis client for the OAuth state store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Short-lived storage for in-flight OAuth authorizations
///
/// Maps the CSRF `state` sent to the identity provider to the PKCE verifier
/// needed to redeem the authorization code when the user comes back.
#[async_trait::async_trait]
pub trait OAuthStateStore: Send + Sync {
    /// Stores the verifier for `ttl` seconds
    async fn save(&self, csrf_state: &str, pkce_verifier: &str, ttl: u64) -> AppResult<()>;

    /// Removes and returns the verifier. A state can be redeemed once.
    async fn take(&self, csrf_state: &str) -> AppResult<Option<String>>;
}

/// Redis-backed [`OAuthStateStore`]
#[derive(Clone)]
pub struct RedisStateStore {
    redis_client: Client,
}

impl RedisStateStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

#[async_trait::async_trait]
impl OAuthStateStore for RedisStateStore {
    async fn save(&self, csrf_state: &str, pkce_verifier: &str, ttl: u64) -> AppResult<()> {
        let key = StoreKey::OAuthState(csrf_state.to_string());
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key.to_string(), pkce_verifier, ttl).await?;
        tracing::debug!(ttl = ttl, "Stored OAuth state");
        Ok(())
    }

    async fn take(&self, csrf_state: &str) -> AppResult<Option<String>> {
        let key = StoreKey::OAuthState(csrf_state.to_string()).to_string();
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        // GET and DEL in one transaction so a state cannot be replayed
        let (verifier,): (Option<String>,) = redis::pipe()
            .atomic()
            .get(&key)
            .del(&key)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_key_display_oauth_state() {
        let key = StoreKey::OAuthState("abc123".to_string());
        assert_eq!(format!("{}", key), "oauth_state:abc123");
    }

    #[test]
    fn test_store_key_preserves_case() {
        // CSRF tokens are case sensitive
        let key = StoreKey::OAuthState("AbC".to_string());
        assert_eq!(key.to_string(), "oauth_state:AbC");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn test_state_can_be_taken_once() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let store = RedisStateStore::new(client);

        store.save("state-once", "verifier", 60).await.unwrap();

        assert_eq!(
            store.take("state-once").await.unwrap(),
            Some("verifier".to_string())
        );
        assert_eq!(store.take("state-once").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis (REDIS_URL)"]
    async fn test_unknown_state_is_none() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let store = RedisStateStore::new(client);

        assert_eq!(store.take("nonexistent_state_12345").await.unwrap(), None);
    }
}
