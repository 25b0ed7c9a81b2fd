use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use cinefeed_api::config::Config;
use cinefeed_api::routes::create_router;
use cinefeed_api::services::{
    IdentityDirectory, MemoryIdentityDirectory, PgIdentityDirectory, TmdbResolver,
};
use cinefeed_api::state::AppState;
use cinefeed_api::store::{create_pool, MemoryReviewStore, PgReviewStore, ReviewStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinefeed_api=info,tower_http=info")),
        )
        .init();

    let (store, directory): (Arc<dyn ReviewStore>, Arc<dyn IdentityDirectory>) =
        match config.database_url.as_deref() {
            Some(url) => {
                let pool = create_pool(url).await?;
                tracing::info!("Connected to PostgreSQL");
                (
                    Arc::new(PgReviewStore::new(pool.clone())),
                    Arc::new(PgIdentityDirectory::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; reviews will not survive restarts");
                (
                    Arc::new(MemoryReviewStore::new()),
                    Arc::new(MemoryIdentityDirectory::new()),
                )
            }
        };

    let cache = match config.redis_url.as_deref() {
        Some(url) => Some(redis::Client::open(url)?),
        None => {
            tracing::warn!("REDIS_URL not set; metadata lookups will be uncached");
            None
        }
    };

    let resolver = Arc::new(TmdbResolver::new(
        config.tmdb_access_token.clone(),
        config.tmdb_api_url.clone(),
        Duration::from_secs(config.metadata_fetch_timeout_secs),
        cache,
    )?);

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(store, directory, resolver, Arc::new(config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
