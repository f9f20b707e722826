pub mod state_store;

pub use state_store::{create_redis_client, OAuthStateStore, RedisStateStore, StoreKey};
