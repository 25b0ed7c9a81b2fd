use std::time::Duration;

use redis::AsyncCommands;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::MovieMetadata;

const METADATA_CACHE_TTL: u64 = 86400; // 1 day

/// External movie-metadata provider.
///
/// Each call is independently fallible; callers decide whether a failure is
/// fatal (direct lookups) or skippable (the search correlator).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Title/poster/release-date for one movie id in one locale.
    async fn resolve(&self, movie_id: &str, locale: &str) -> AppResult<MovieMetadata>;

    /// Free-text movie search against the provider, in one locale.
    async fn search(&self, query: &str, locale: &str) -> AppResult<Vec<MovieMetadata>>;
}

#[derive(Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<MovieMetadata>,
}

/// TMDB-backed resolver with a best-effort Redis cache.
///
/// Cache failures are logged and treated as misses; they never surface to
/// callers.
#[derive(Clone)]
pub struct TmdbResolver {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    cache: Option<redis::Client>,
}

impl TmdbResolver {
    pub fn new(
        access_token: String,
        api_url: String,
        fetch_timeout: Duration,
        cache: Option<redis::Client>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token,
            api_url,
            cache,
        })
    }

    async fn cache_get(&self, key: &str) -> Option<MovieMetadata> {
        let client = self.cache.as_ref()?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| tracing::warn!(error = %e, "Redis connection failed"))
            .ok()?;
        let json: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Redis get failed"))
            .ok()?;
        serde_json::from_str(&json?).ok()
    }

    async fn cache_put(&self, key: &str, meta: &MovieMetadata) {
        let Some(client) = self.cache.as_ref() else {
            return;
        };
        let Ok(json) = serde_json::to_string(meta) else {
            return;
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<(), redis::RedisError> =
                    conn.set_ex(key, json, METADATA_CACHE_TTL).await;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Redis set failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Redis connection failed"),
        }
    }
}

#[async_trait::async_trait]
impl MetadataResolver for TmdbResolver {
    async fn resolve(&self, movie_id: &str, locale: &str) -> AppResult<MovieMetadata> {
        let cache_key = format!("meta:{}:{}", locale, movie_id);
        if let Some(cached) = self.cache_get(&cache_key).await {
            tracing::debug!(movie_id = %movie_id, locale = %locale, "Metadata cache hit");
            return Ok(cached);
        }

        let url = format!("{}/movie/{}", self.api_url, movie_id);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("language", locale)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Upstream(format!(
                "Metadata provider returned status {} for movie {}",
                status, movie_id
            )));
        }

        let meta: MovieMetadata = response.json().await?;
        self.cache_put(&cache_key, &meta).await;

        tracing::debug!(movie_id = %movie_id, locale = %locale, title = %meta.title, "Metadata fetched");
        Ok(meta)
    }

    async fn search(&self, query: &str, locale: &str) -> AppResult<Vec<MovieMetadata>> {
        let url = format!("{}/search/movie", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("query", query), ("language", locale), ("page", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Upstream(format!(
                "Metadata provider returned status {} for search",
                status
            )));
        }

        let parsed: TmdbSearchResponse = response.json().await?;

        tracing::info!(
            query = %query,
            locale = %locale,
            results = parsed.results.len(),
            "Movie search completed"
        );

        Ok(parsed.results)
    }
}
