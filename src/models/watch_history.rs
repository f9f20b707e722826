use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

use super::MovieId;

/// Ratings a user may give a watched movie
pub const RATING_RANGE: RangeInclusive<i32> = 1..=10;

/// A movie the user marked as watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: MovieId,
    pub movie_title: String,
    pub rating: Option<i32>,
    pub watched_at: DateTime<Utc>,
}

/// Fields supplied when marking a movie as watched
#[derive(Debug, Clone, PartialEq)]
pub struct NewWatchEntry {
    pub movie_id: MovieId,
    pub movie_title: String,
    pub rating: Option<i32>,
}

/// Aggregate over the rated entries of a user's history
#[derive(Debug, Clone, Copy, Default, PartialEq, sqlx::FromRow)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: i64,
}

/// True when `rating` is a valid user rating
pub fn is_valid_rating(rating: i32) -> bool {
    RATING_RANGE.contains(&rating)
}
