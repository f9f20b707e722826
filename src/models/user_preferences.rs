use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rating threshold used when a user has not chosen one
pub const DEFAULT_MIN_RATING: f64 = 6.0;

/// Content preferences of a single user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct UserPreferences {
    pub user_id: Uuid,
    /// Comma-separated free-text genre names
    pub favorite_genres: String,
    /// Comma-separated free-text actor names
    pub favorite_actors: String,
    pub min_rating: f64,
    pub preferred_language: String,
}

impl UserPreferences {
    /// Preferences a user gets before setting any
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            favorite_genres: String::new(),
            favorite_actors: String::new(),
            min_rating: DEFAULT_MIN_RATING,
            preferred_language: "en".to_string(),
        }
    }

    /// Threshold the recommender filters on.
    ///
    /// A zero or negative stored value counts as unset.
    pub fn effective_min_rating(&self) -> f64 {
        if self.min_rating > 0.0 {
            self.min_rating
        } else {
            DEFAULT_MIN_RATING
        }
    }

    /// Applies a partial update in place
    pub fn apply(&mut self, update: PreferencesUpdate) {
        if let Some(genres) = update.favorite_genres {
            self.favorite_genres = genres;
        }
        if let Some(actors) = update.favorite_actors {
            self.favorite_actors = actors;
        }
        if let Some(min_rating) = update.min_rating {
            self.min_rating = min_rating;
        }
        if let Some(language) = update.preferred_language {
            self.preferred_language = language;
        }
    }
}

/// Partial preferences update as sent by the frontend
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub favorite_genres: Option<String>,
    pub favorite_actors: Option<String>,
    pub min_rating: Option<f64>,
    pub preferred_language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let user_id = Uuid::new_v4();
        let prefs = UserPreferences::defaults_for(user_id);
        assert_eq!(prefs.user_id, user_id);
        assert!(prefs.favorite_genres.is_empty());
        assert_eq!(prefs.min_rating, DEFAULT_MIN_RATING);
        assert_eq!(prefs.preferred_language, "en");
    }

    #[test]
    fn test_zero_min_rating_falls_back_to_default() {
        let mut prefs = UserPreferences::defaults_for(Uuid::new_v4());
        prefs.min_rating = 0.0;
        assert_eq!(prefs.effective_min_rating(), DEFAULT_MIN_RATING);

        prefs.min_rating = 7.5;
        assert_eq!(prefs.effective_min_rating(), 7.5);
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut prefs = UserPreferences::defaults_for(Uuid::new_v4());
        prefs.favorite_actors = "Keanu Reeves".to_string();

        prefs.apply(PreferencesUpdate {
            favorite_genres: Some("Action, Comedy".to_string()),
            min_rating: Some(7.0),
            ..Default::default()
        });

        assert_eq!(prefs.favorite_genres, "Action, Comedy");
        assert_eq!(prefs.favorite_actors, "Keanu Reeves");
        assert_eq!(prefs.min_rating, 7.0);
        assert_eq!(prefs.preferred_language, "en");
    }

    #[test]
    fn test_update_accepts_camel_case() {
        let json = r#"{"favoriteGenres": "Drama", "minRating": 6.5}"#;
        let update: PreferencesUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.favorite_genres.as_deref(), Some("Drama"));
        assert_eq!(update.min_rating, Some(6.5));
        assert_eq!(update.preferred_language, None);
    }
}
