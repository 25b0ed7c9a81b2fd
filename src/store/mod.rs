use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Review;

pub mod memory;
pub mod postgres;

pub use memory::MemoryReviewStore;
pub use postgres::{create_pool, PgReviewStore};

/// Sort keys for a user's own review list.
///
/// Title-based sorts order by `movie_id`, the only title-shaped key stored
/// locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserSort {
    #[default]
    Recent,
    Oldest,
    RatingDesc,
    RatingAsc,
    TitleAsc,
    TitleDesc,
}

/// Sort modes for the explore feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    #[default]
    Recent,
    Popular,
}

/// Predicate, sort and pagination window for one explore query.
#[derive(Debug, Clone)]
pub struct ExploreFilter {
    /// Requester; their own reviews are always excluded
    pub requester_id: Uuid,
    /// Optional exact movie filter
    pub movie_id: Option<String>,
    /// Optional author candidate set (AND-combined with the movie filter)
    pub author_ids: Option<Vec<Uuid>>,
    pub sort: FeedSort,
    pub offset: i64,
    pub limit: i64,
}

/// One page of explore results plus the unpaginated match count.
#[derive(Debug)]
pub struct ExplorePage {
    pub reviews: Vec<Review>,
    pub total: i64,
}

/// A user's reviews plus the distinct movies they reference.
#[derive(Debug)]
pub struct UserReviews {
    pub reviews: Vec<Review>,
    pub movie_ids: Vec<String>,
}

/// Post-toggle (or current) like state of one review for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub likes_count: i64,
    pub has_liked: bool,
}

/// Persistence boundary for reviews.
///
/// Implementations must guarantee that `toggle_like` is atomic per review:
/// two concurrent toggles on the same review can never leave `likes_count`
/// diverged from the membership set. Toggles on distinct reviews need no
/// mutual coordination.
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    /// Creates a review; at most one per (user, movie).
    async fn create(
        &self,
        user_id: Uuid,
        movie_id: &str,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review>;

    /// Updates rating/comment of the caller's review for a movie.
    async fn update(
        &self,
        user_id: Uuid,
        movie_id: &str,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review>;

    /// Permanently removes the caller's review for a movie; returns its id.
    async fn delete(&self, user_id: Uuid, movie_id: &str) -> AppResult<Uuid>;

    async fn list_by_user(&self, user_id: Uuid, sort: UserSort) -> AppResult<UserReviews>;

    /// All reviews for a movie regardless of visibility, newest first.
    async fn list_by_movie(&self, movie_id: &str) -> AppResult<Vec<Review>>;

    /// Atomically flips the user's like and the denormalized counter.
    async fn toggle_like(&self, review_id: Uuid, user_id: Uuid) -> AppResult<LikeState>;

    async fn like_state(&self, review_id: Uuid, user_id: Uuid) -> AppResult<LikeState>;

    async fn explore(&self, filter: &ExploreFilter) -> AppResult<ExplorePage>;

    /// Distinct movie ids referenced by visible reviews, in a stable order.
    async fn distinct_visible_movie_ids(&self) -> AppResult<Vec<String>>;

    async fn count_visible_by_movie(&self, movie_id: &str) -> AppResult<i64>;
}
