use serde::{Deserialize, Serialize};

/// Movie metadata as returned by the external provider for one locale.
///
/// Deserialized straight from the TMDB movie-details/search payloads;
/// unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieMetadata {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

/// One entry of the review-driven movie search result, ranked by popularity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieMatch {
    pub movie_id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub reviews_count: i64,
}

/// Normalized movie entry for the metadata pass-through endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MovieSummary {
    pub id: Option<i64>,
    pub title: String,
    pub year: Option<i32>,
    pub poster: Option<String>,
    pub overview: String,
    pub vote_average: f64,
}

impl MovieSummary {
    pub fn from_metadata(meta: &MovieMetadata, image_url: &str, poster_width: &str) -> Self {
        Self {
            id: meta.id,
            title: meta.title.clone(),
            year: release_year(meta.release_date.as_deref())
                .and_then(|y| y.parse::<i32>().ok()),
            poster: meta
                .poster_path
                .as_deref()
                .map(|p| poster_url(image_url, poster_width, p)),
            overview: meta.overview.clone().unwrap_or_default(),
            vote_average: meta.vote_average.unwrap_or(0.0),
        }
    }
}

/// Leading year component of a `YYYY-MM-DD` release date.
pub fn release_year(release_date: Option<&str>) -> Option<String> {
    let date = release_date?.trim();
    if date.is_empty() {
        return None;
    }
    Some(date.split('-').next().unwrap_or(date).to_string())
}

/// Full CDN URL for a TMDB poster path (paths start with `/`).
pub fn poster_url(image_url: &str, width: &str, poster_path: &str) -> String {
    format!("{}/{}{}", image_url, width, poster_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year_extracts_leading_component() {
        assert_eq!(release_year(Some("1999-03-31")), Some("1999".to_string()));
    }

    #[test]
    fn test_release_year_handles_missing_and_empty() {
        assert_eq!(release_year(None), None);
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(Some("  ")), None);
    }

    #[test]
    fn test_poster_url_joins_base_width_and_path() {
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p", "w92", "/abc.jpg"),
            "https://image.tmdb.org/t/p/w92/abc.jpg"
        );
    }

    #[test]
    fn test_metadata_deserialization_ignores_unknown_fields() {
        let json = r#"{
            "id": 603,
            "title": "The Matrix",
            "release_date": "1999-03-31",
            "poster_path": "/matrix.jpg",
            "overview": "A hacker learns the truth.",
            "vote_average": 8.2,
            "budget": 63000000
        }"#;

        let meta: MovieMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.id, Some(603));
        assert_eq!(meta.title, "The Matrix");
        assert_eq!(meta.release_date.as_deref(), Some("1999-03-31"));
    }

    #[test]
    fn test_metadata_tolerates_sparse_payloads() {
        let meta: MovieMetadata = serde_json::from_str(r#"{"title": "Matrix"}"#).unwrap();
        assert!(meta.release_date.is_none());
        assert!(meta.poster_path.is_none());
    }

    #[test]
    fn test_summary_defaults_missing_fields() {
        let meta: MovieMetadata = serde_json::from_str(r#"{"title": "Matrix"}"#).unwrap();
        let summary = MovieSummary::from_metadata(&meta, "https://img", "w500");
        assert_eq!(summary.overview, "");
        assert_eq!(summary.vote_average, 0.0);
        assert!(summary.poster.is_none());
        assert!(summary.year.is_none());
    }
}
