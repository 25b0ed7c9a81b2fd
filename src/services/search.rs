use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::AppResult;
use crate::models::{poster_url, release_year, MovieMatch, MovieMetadata};
use crate::services::metadata::MetadataResolver;
use crate::store::ReviewStore;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
const POSTER_WIDTH: &str = "w92";

/// Fuzzy title match on lowercase-normalized strings: the title contains the
/// whole query, or every whitespace token of the query independently.
pub fn title_matches(title: &str, normalized_query: &str) -> bool {
    let title = title.to_lowercase();
    title.contains(normalized_query)
        || normalized_query
            .split_whitespace()
            .all(|word| title.contains(word))
}

/// Cross-references locally reviewed movie ids against the metadata provider
/// to answer "which reviewed movies match this text query".
///
/// Per-movie metadata fetches fan out with bounded concurrency; any of them
/// may fail without affecting the others or the overall call.
pub struct MovieSearchCorrelator {
    store: Arc<dyn ReviewStore>,
    resolver: Arc<dyn MetadataResolver>,
    primary_locale: String,
    fallback_locale: String,
    image_url: String,
    max_concurrency: usize,
}

impl MovieSearchCorrelator {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        resolver: Arc<dyn MetadataResolver>,
        primary_locale: String,
        fallback_locale: String,
        image_url: String,
        max_concurrency: usize,
    ) -> Self {
        Self {
            store,
            resolver,
            primary_locale,
            fallback_locale,
            image_url,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<MovieMatch>> {
        let normalized_query = query.trim().to_lowercase();
        if normalized_query.is_empty() {
            return Ok(Vec::new());
        }

        let movie_ids = self.store.distinct_visible_movie_ids().await?;
        if movie_ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            candidates = movie_ids.len(),
            query = %normalized_query,
            "Correlating reviewed movies against metadata titles"
        );

        // Fan out per movie, both locales per task; joined in dispatch order
        // so ranking ties stay stable.
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = Vec::with_capacity(movie_ids.len());
        for movie_id in movie_ids {
            let resolver = self.resolver.clone();
            let semaphore = semaphore.clone();
            let primary_locale = self.primary_locale.clone();
            let fallback_locale = self.fallback_locale.clone();
            let task_movie_id = movie_id.clone();
            let task = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let (primary, fallback) = tokio::join!(
                    resolver.resolve(&task_movie_id, &primary_locale),
                    resolver.resolve(&task_movie_id, &fallback_locale),
                );
                if let Err(e) = &primary {
                    tracing::debug!(movie_id = %task_movie_id, locale = %primary_locale, error = %e, "Metadata fetch failed");
                }
                if let Err(e) = &fallback {
                    tracing::debug!(movie_id = %task_movie_id, locale = %fallback_locale, error = %e, "Metadata fetch failed");
                }
                match (primary, fallback) {
                    (Err(_), Err(_)) => None,
                    (primary, fallback) => Some((primary.ok(), fallback.ok())),
                }
            });
            tasks.push((movie_id, task));
        }

        let mut matches = Vec::new();
        for (movie_id, task) in tasks {
            let (primary, fallback) = match task.await {
                Ok(Some(fetched)) => fetched,
                Ok(None) => {
                    // Both locales failed: skip this movie, never the call.
                    tracing::debug!(movie_id = %movie_id, "Metadata unavailable in all locales, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(movie_id = %movie_id, error = %e, "Metadata task failed");
                    continue;
                }
            };

            if let Some(candidate) =
                self.build_match(&movie_id, primary.as_ref(), fallback.as_ref(), &normalized_query)
            {
                let reviews_count = self.store.count_visible_by_movie(&movie_id).await?;
                matches.push(MovieMatch {
                    reviews_count,
                    ..candidate
                });
            }
        }

        matches.sort_by(|a, b| b.reviews_count.cmp(&a.reviews_count));
        matches.truncate(limit);
        Ok(matches)
    }

    /// Applies the bilingual match rule and assembles display fields,
    /// preferring the primary locale and falling back to the secondary.
    fn build_match(
        &self,
        movie_id: &str,
        primary: Option<&MovieMetadata>,
        fallback: Option<&MovieMetadata>,
        normalized_query: &str,
    ) -> Option<MovieMatch> {
        let matched = [primary, fallback]
            .iter()
            .flatten()
            .any(|meta| title_matches(&meta.title, normalized_query));
        if !matched {
            return None;
        }

        let title = primary
            .map(|m| m.title.clone())
            .or_else(|| fallback.map(|m| m.title.clone()))?;
        let year = release_year(primary.and_then(|m| m.release_date.as_deref()))
            .or_else(|| release_year(fallback.and_then(|m| m.release_date.as_deref())));
        let poster = primary
            .and_then(|m| m.poster_path.as_deref())
            .or_else(|| fallback.and_then(|m| m.poster_path.as_deref()))
            .map(|path| poster_url(&self.image_url, POSTER_WIDTH, path));

        Some(MovieMatch {
            movie_id: movie_id.to_string(),
            title,
            year,
            poster,
            reviews_count: 0,
        })
    }
}
