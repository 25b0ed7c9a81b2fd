use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; when absent the in-memory store is used
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL; when absent metadata lookups are uncached
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB API bearer access token
    pub tmdb_access_token: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image CDN base URL
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Locale queried first for movie metadata
    #[serde(default = "default_primary_locale")]
    pub primary_locale: String,

    /// Locale queried as a fallback for movie metadata
    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: String,

    /// HMAC secret shared with the authentication service
    pub jwt_secret: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-call timeout for metadata fetches, in seconds
    #[serde(default = "default_metadata_fetch_timeout_secs")]
    pub metadata_fetch_timeout_secs: u64,

    /// Maximum concurrent metadata fetches during correlation
    #[serde(default = "default_metadata_concurrency")]
    pub metadata_concurrency: usize,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_primary_locale() -> String {
    "es-ES".to_string()
}

fn default_fallback_locale() -> String {
    "en-US".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_metadata_fetch_timeout_secs() -> u64 {
    5
}

fn default_metadata_concurrency() -> usize {
    8
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
