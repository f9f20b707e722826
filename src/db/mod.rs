pub mod postgres;
pub mod preferences;
pub mod redis;
pub mod users;
pub mod watch_history;

pub use postgres::{create_pool, run_migrations};
pub use preferences::{PgPreferencesStore, PreferencesStore};
pub use self::redis::{create_redis_client, OAuthStateStore, RedisStateStore, StoreKey};
pub use users::{PgUserStore, UserStore};
pub use watch_history::{PgWatchHistoryStore, WatchHistoryStore};
