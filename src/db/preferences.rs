use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{PreferencesUpdate, UserPreferences},
};

/// Per-user content preferences
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Stored preferences, or `None` if the user never had any created
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>>;

    /// Inserts default preferences; existing preferences are left untouched
    async fn create_default(&self, user_id: Uuid) -> AppResult<UserPreferences>;

    /// Applies a partial update, creating the row from defaults if needed
    async fn upsert(&self, user_id: Uuid, update: PreferencesUpdate) -> AppResult<UserPreferences> {
        let defaults = UserPreferences::defaults_for(user_id);

        // Unset fields keep the stored column, merged inside the statement
        let sql = format!(
            "INSERT INTO user_preferences ({cols}) VALUES \
                ($1, COALESCE($2, $6), COALESCE($3, $7), COALESCE($4, $8), COALESCE($5, $9)) \
             ON CONFLICT (user_id) DO UPDATE SET \
                favorite_genres = COALESCE($2, user_preferences.favorite_genres), \
                favorite_actors = COALESCE($3, user_preferences.favorite_actors), \
                min_rating = COALESCE($4, user_preferences.min_rating), \
                preferred_language = COALESCE($5, user_preferences.preferred_language) \
             RETURNING {cols}",
            cols = PREFERENCE_COLUMNS
        );

        let stored = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(update.favorite_genres)
            .bind(update.favorite_actors)
            .bind(update.min_rating)
            .bind(update.preferred_language)
            .bind(&defaults.favorite_genres)
            .bind(&defaults.favorite_actors)
            .bind(defaults.min_rating)
            .bind(&defaults.preferred_language)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(user_id = %user_id, "Preferences saved");

        Ok(stored)
    }
}
