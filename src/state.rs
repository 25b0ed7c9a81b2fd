use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    FeedQueryEngine, IdentityDirectory, MetadataResolver, MovieSearchCorrelator,
};
use crate::store::ReviewStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReviewStore>,
    pub directory: Arc<dyn IdentityDirectory>,
    pub resolver: Arc<dyn MetadataResolver>,
    pub feed: Arc<FeedQueryEngine>,
    pub correlator: Arc<MovieSearchCorrelator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        directory: Arc<dyn IdentityDirectory>,
        resolver: Arc<dyn MetadataResolver>,
        config: Arc<Config>,
    ) -> Self {
        let feed = Arc::new(FeedQueryEngine::new(store.clone(), directory.clone()));
        let correlator = Arc::new(MovieSearchCorrelator::new(
            store.clone(),
            resolver.clone(),
            config.primary_locale.clone(),
            config.fallback_locale.clone(),
            config.tmdb_image_url.clone(),
            config.metadata_concurrency,
        ));

        Self {
            store,
            directory,
            resolver,
            feed,
            correlator,
            config,
        }
    }
}
