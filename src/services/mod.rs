pub mod feed;
pub mod identity;
pub mod metadata;
pub mod search;

pub use feed::{ExploreParams, FeedPage, FeedQueryEngine};
pub use identity::{IdentityDirectory, MemoryIdentityDirectory, PgIdentityDirectory};
pub use metadata::{MetadataResolver, TmdbResolver};
pub use search::{MovieSearchCorrelator, DEFAULT_SEARCH_LIMIT};
