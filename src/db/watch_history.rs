use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{NewWatchEntry, RatingSummary, WatchHistoryEntry},
};

/// A user's record of watched movies
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchHistoryStore: Send + Sync {
    async fn append(&self, user_id: Uuid, entry: NewWatchEntry) -> AppResult<WatchHistoryEntry>;

    /// All entries of the user, most recently watched first
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<WatchHistoryEntry>>;

    /// Sets the rating of an entry owned by `user_id`.
    /// Returns `false` when no such entry exists.
    async fn update_rating(&self, user_id: Uuid, entry_id: Uuid, rating: i32) -> AppResult<bool>;

    /// Deletes an entry owned by `user_id`.
    /// Returns `false` when no such entry exists.
    async fn delete(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool>;

    /// Average and count over the rated entries
    async fn rating_summary(&self, user_id: Uuid) -> AppResult<RatingSummary>;
}

const ENTRY_COLUMNS: &str = "id, user_id, movie_id, movie_title, rating, watched_at";

/// PostgreSQL-backed [`WatchHistoryStore`]
#[derive(Clone)]
pub struct PgWatchHistoryStore {
    pool: PgPool,
}

impl PgWatchHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WatchHistoryStore for PgWatchHistoryStore {
    async fn append(&self, user_id: Uuid, entry: NewWatchEntry) -> AppResult<WatchHistoryEntry> {
        let sql = format!(
            "INSERT INTO watch_history (id, user_id, movie_id, movie_title, rating) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ENTRY_COLUMNS
        );

        let stored: WatchHistoryEntry = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(entry.movie_id)
            .bind(&entry.movie_title)
            .bind(entry.rating)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(
            user_id = %user_id,
            movie_id = stored.movie_id,
            rating = ?stored.rating,
            "Movie marked as watched"
        );

        Ok(stored)
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<WatchHistoryEntry>> {
        let sql = format!(
            "SELECT {} FROM watch_history WHERE user_id = $1 ORDER BY watched_at DESC",
            ENTRY_COLUMNS
        );
        let entries = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    async fn update_rating(&self, user_id: Uuid, entry_id: Uuid, rating: i32) -> AppResult<bool> {
        let result = sqlx::query("UPDATE watch_history SET rating = $1 WHERE id = $2 AND user_id = $3")
            .bind(rating)
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watch_history WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rating_summary(&self, user_id: Uuid) -> AppResult<RatingSummary> {
        let summary = sqlx::query_as(
            "SELECT AVG(rating)::DOUBLE PRECISION AS average, COUNT(*) AS count \
             FROM watch_history WHERE user_id = $1 AND rating IS NOT NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
