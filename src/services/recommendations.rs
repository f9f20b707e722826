use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{PreferencesStore, WatchHistoryStore},
    error::{AppError, AppResult},
    models::{
        Genre, GenreId, Movie, MovieId, MovieWithPoster, UserPreferences, WatchHistoryEntry,
        DEFAULT_MIN_RATING,
    },
    services::providers::{optional_image_url, MovieProvider},
};

/// Favorite genres considered per request
pub const MAX_FAVORITE_GENRES: usize = 3;
/// Candidates kept from each favorite genre
pub const PER_GENRE_LIMIT: usize = 5;
/// Upper bound on returned recommendations
pub const MAX_RECOMMENDATIONS: usize = 20;

/// What the user has already seen.
///
/// `average_rating` over the rated entries is computed but does not influence
/// selection yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchProfile {
    pub watched: HashSet<MovieId>,
    pub rated_count: usize,
    pub average_rating: Option<f64>,
}

impl WatchProfile {
    pub fn from_history(history: &[WatchHistoryEntry]) -> Self {
        let watched = history.iter().map(|entry| entry.movie_id).collect();
        let ratings: Vec<i32> = history.iter().filter_map(|entry| entry.rating).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
        };

        Self {
            watched,
            rated_count: ratings.len(),
            average_rating,
        }
    }
}

/// Case-insensitive lookup from genre name to provider genre id
///
/// Names must match exactly apart from case.
#[derive(Debug, Clone, Default)]
pub struct GenreIndex {
    by_name: HashMap<String, GenreId>,
}

impl GenreIndex {
    pub fn new(genres: Vec<Genre>) -> Self {
        let by_name = genres
            .into_iter()
            .map(|genre| (genre.name.to_lowercase(), genre.id))
            .collect();
        Self { by_name }
    }

    pub fn resolve(&self, name: &str) -> Option<GenreId> {
        self.by_name.get(&name.to_lowercase()).copied()
    }
}

/// Splits the free-text favorite genre list.
///
/// Entries are trimmed, blanks dropped, case-insensitive duplicates removed,
/// and at most `limit` names are kept in order of appearance. Blank and
/// duplicate entries do not use up one of the `limit` slots.
pub fn parse_favorite_genres(raw: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Why a favorite genre contributed no candidates
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The name does not match any provider genre
    Unresolved,
    /// Fetching the genre's movies failed
    FetchFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedGenre {
    pub name: String,
    pub reason: SkipReason,
}

/// Where the candidates of a selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    FavoriteGenres,
    Popular,
}

/// Outcome of one recommendation pass, including the genres that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub recommendations: Vec<MovieWithPoster>,
    pub source: CandidateSource,
    pub skipped_genres: Vec<SkippedGenre>,
}

/// Candidates gathered across favorite genres, with the failures collected
/// rather than raised
#[derive(Debug, Default)]
struct GenreHarvest {
    candidates: Vec<Movie>,
    skipped: Vec<SkippedGenre>,
}

/// Movies that are unwatched and meet the rating threshold, in input order
fn eligible<'a>(
    movies: Vec<Movie>,
    watched: &'a HashSet<MovieId>,
    min_rating: f64,
) -> impl Iterator<Item = Movie> + 'a {
    movies
        .into_iter()
        .filter(move |movie| !watched.contains(&movie.id))
        .filter(move |movie| movie.vote_average >= min_rating)
}

/// Deduplicates by id (first occurrence wins), orders by vote average
/// descending and truncates. The sort is stable: equal scores keep their
/// candidate order.
pub fn rank(candidates: Vec<Movie>) -> Vec<Movie> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Movie> = candidates
        .into_iter()
        .filter(|movie| seen.insert(movie.id))
        .collect();

    unique.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
    unique.truncate(MAX_RECOMMENDATIONS);
    unique
}

/// Picks movies for a user from their favorite genres, falling back to the
/// provider's popular list
#[derive(Clone)]
pub struct RecommendationSelector {
    preferences: Arc<dyn PreferencesStore>,
    watch_history: Arc<dyn WatchHistoryStore>,
    provider: Arc<dyn MovieProvider>,
}

impl RecommendationSelector {
    pub fn new(
        preferences: Arc<dyn PreferencesStore>,
        watch_history: Arc<dyn WatchHistoryStore>,
        provider: Arc<dyn MovieProvider>,
    ) -> Self {
        Self {
            preferences,
            watch_history,
            provider,
        }
    }

    /// Ordered recommendations for the user, possibly empty
    pub async fn get_recommendations(&self, user_id: Uuid) -> AppResult<Vec<MovieWithPoster>> {
        Ok(self.select(user_id).await?.recommendations)
    }

    /// Runs the full selection and reports how it was reached
    pub async fn select(&self, user_id: Uuid) -> AppResult<Selection> {
        let preferences = self.preferences.find_by_user(user_id).await?;
        let history = self.watch_history.list_by_user(user_id).await?;
        let profile = WatchProfile::from_history(&history);

        let min_rating = preferences
            .as_ref()
            .map(UserPreferences::effective_min_rating)
            .unwrap_or(DEFAULT_MIN_RATING);
        let favorite_genres = preferences
            .as_ref()
            .map(|prefs| parse_favorite_genres(&prefs.favorite_genres, MAX_FAVORITE_GENRES))
            .unwrap_or_default();

        tracing::debug!(
            user_id = %user_id,
            watched = profile.watched.len(),
            rated = profile.rated_count,
            average_rating = ?profile.average_rating,
            min_rating = min_rating,
            favorite_genres = ?favorite_genres,
            "Selecting recommendations"
        );

        let mut harvest = GenreHarvest::default();
        if !favorite_genres.is_empty() {
            let index = GenreIndex::new(self.provider.get_genres().await?);
            harvest = self
                .harvest_genres(&favorite_genres, &index, &profile.watched, min_rating)
                .await;
        }

        let (candidates, source) = if harvest.candidates.is_empty() {
            let popular = self.provider.get_popular_movies(1).await?;
            let candidates = eligible(popular.results, &profile.watched, min_rating)
                .take(MAX_RECOMMENDATIONS)
                .collect();
            (candidates, CandidateSource::Popular)
        } else {
            (harvest.candidates, CandidateSource::FavoriteGenres)
        };

        let recommendations: Vec<MovieWithPoster> = rank(candidates)
            .into_iter()
            .map(|movie| {
                let poster_url = optional_image_url(self.provider.as_ref(), movie.poster_path.as_deref());
                MovieWithPoster { movie, poster_url }
            })
            .collect();

        tracing::info!(
            user_id = %user_id,
            count = recommendations.len(),
            source = ?source,
            skipped_genres = harvest.skipped.len(),
            "Recommendations selected"
        );

        Ok(Selection {
            recommendations,
            source,
            skipped_genres: harvest.skipped,
        })
    }

    /// Fetches page 1 of every resolvable favorite genre.
    ///
    /// Fetches run concurrently but results are consumed in the order of
    /// `genre_names`, so candidate order does not depend on which request
    /// finishes first. A failed genre is recorded and skipped.
    async fn harvest_genres(
        &self,
        genre_names: &[String],
        index: &GenreIndex,
        watched: &HashSet<MovieId>,
        min_rating: f64,
    ) -> GenreHarvest {
        let mut harvest = GenreHarvest::default();
        let mut tasks = Vec::new();

        for name in genre_names {
            match index.resolve(name) {
                Some(genre_id) => {
                    let provider = Arc::clone(&self.provider);
                    let task = tokio::spawn(async move {
                        provider.get_movies_by_genre(genre_id, 1).await
                    });
                    tasks.push((name.clone(), task));
                }
                None => {
                    tracing::debug!(genre = %name, "Favorite genre not known to provider");
                    harvest.skipped.push(SkippedGenre {
                        name: name.clone(),
                        reason: SkipReason::Unresolved,
                    });
                }
            }
        }

        for (name, task) in tasks {
            let result = task
                .await
                .unwrap_or_else(|e| Err(AppError::Internal(e.to_string())));

            match result {
                Ok(page) => {
                    harvest
                        .candidates
                        .extend(eligible(page.results, watched, min_rating).take(PER_GENRE_LIMIT));
                }
                Err(e) => {
                    tracing::warn!(genre = %name, error = %e, "Skipping genre after fetch failure");
                    harvest.skipped.push(SkippedGenre {
                        name,
                        reason: SkipReason::FetchFailed(e.to_string()),
                    });
                }
            }
        }

        harvest
    }
}
