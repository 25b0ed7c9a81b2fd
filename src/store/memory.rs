use std::cmp::Ordering;
use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{validate_review_fields, Review};

use super::{ExploreFilter, ExplorePage, FeedSort, LikeState, ReviewStore, UserReviews, UserSort};

/// In-memory review store.
///
/// Used when no `DATABASE_URL` is configured and by the test suite. The
/// single write guard doubles as the atomic toggle primitive: a like toggle
/// holds the lock across its read-modify-write, so the membership set and
/// counter always move together.
#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: RwLock<HashMap<Uuid, Review>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found".to_string())
}

/// Newest-first, with review id as the final tiebreak for determinism.
fn by_created_desc(a: &Review, b: &Review) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn user_sort_cmp(sort: UserSort) -> impl Fn(&Review, &Review) -> Ordering {
    move |a, b| match sort {
        UserSort::Recent => by_created_desc(a, b),
        UserSort::Oldest => a
            .created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id)),
        UserSort::RatingDesc => b.rating.cmp(&a.rating).then_with(|| by_created_desc(a, b)),
        UserSort::RatingAsc => a.rating.cmp(&b.rating).then_with(|| by_created_desc(a, b)),
        UserSort::TitleAsc => a
            .movie_id
            .cmp(&b.movie_id)
            .then_with(|| by_created_desc(a, b)),
        UserSort::TitleDesc => b
            .movie_id
            .cmp(&a.movie_id)
            .then_with(|| by_created_desc(a, b)),
    }
}

#[async_trait::async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn create(
        &self,
        user_id: Uuid,
        movie_id: &str,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review> {
        let comment = validate_review_fields(rating, comment)?;
        let mut reviews = self.reviews.write().await;

        if let Some(existing) = reviews
            .values()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
        {
            return Err(AppError::DuplicateReview {
                movie_id: movie_id.to_string(),
                existing_review_id: existing.id,
            });
        }

        let review = Review::new(user_id, movie_id.to_string(), rating, comment);
        reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn update(
        &self,
        user_id: Uuid,
        movie_id: &str,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review> {
        let comment = validate_review_fields(rating, comment)?;
        let mut reviews = self.reviews.write().await;

        let review = reviews
            .values_mut()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .ok_or_else(review_not_found)?;

        review.rating = rating;
        review.comment = comment;
        review.updated_at = chrono::Utc::now();
        Ok(review.clone())
    }

    async fn delete(&self, user_id: Uuid, movie_id: &str) -> AppResult<Uuid> {
        let mut reviews = self.reviews.write().await;

        let id = reviews
            .values()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .map(|r| r.id)
            .ok_or_else(review_not_found)?;

        reviews.remove(&id);
        Ok(id)
    }

    async fn list_by_user(&self, user_id: Uuid, sort: UserSort) -> AppResult<UserReviews> {
        let reviews = self.reviews.read().await;

        let mut owned: Vec<Review> = reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(user_sort_cmp(sort));

        let mut movie_ids = Vec::new();
        for review in &owned {
            if !movie_ids.contains(&review.movie_id) {
                movie_ids.push(review.movie_id.clone());
            }
        }

        Ok(UserReviews {
            reviews: owned,
            movie_ids,
        })
    }

    async fn list_by_movie(&self, movie_id: &str) -> AppResult<Vec<Review>> {
        let reviews = self.reviews.read().await;

        let mut found: Vec<Review> = reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect();
        found.sort_by(by_created_desc);
        Ok(found)
    }

    async fn toggle_like(&self, review_id: Uuid, user_id: Uuid) -> AppResult<LikeState> {
        let mut reviews = self.reviews.write().await;
        let review = reviews.get_mut(&review_id).ok_or_else(review_not_found)?;

        let has_liked = if let Some(pos) = review.likes.iter().position(|id| *id == user_id) {
            review.likes.remove(pos);
            review.likes_count -= 1;
            false
        } else {
            review.likes.push(user_id);
            review.likes_count += 1;
            true
        };

        Ok(LikeState {
            likes_count: review.likes_count,
            has_liked,
        })
    }

    async fn like_state(&self, review_id: Uuid, user_id: Uuid) -> AppResult<LikeState> {
        let reviews = self.reviews.read().await;
        let review = reviews.get(&review_id).ok_or_else(review_not_found)?;

        Ok(LikeState {
            likes_count: review.likes_count,
            has_liked: review.has_liked(user_id),
        })
    }

    async fn explore(&self, filter: &ExploreFilter) -> AppResult<ExplorePage> {
        let reviews = self.reviews.read().await;

        let mut matched: Vec<Review> = reviews
            .values()
            .filter(|r| r.is_visible && r.user_id != filter.requester_id)
            .filter(|r| {
                filter
                    .movie_id
                    .as_ref()
                    .map_or(true, |movie_id| &r.movie_id == movie_id)
            })
            .filter(|r| {
                filter
                    .author_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&r.user_id))
            })
            .cloned()
            .collect();

        match filter.sort {
            FeedSort::Popular => matched.sort_by(|a, b| {
                b.likes_count
                    .cmp(&a.likes_count)
                    .then_with(|| by_created_desc(a, b))
            }),
            FeedSort::Recent => matched.sort_by(by_created_desc),
        }

        let total = matched.len() as i64;
        let page: Vec<Review> = matched
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();

        Ok(ExplorePage {
            reviews: page,
            total,
        })
    }

    async fn distinct_visible_movie_ids(&self) -> AppResult<Vec<String>> {
        let reviews = self.reviews.read().await;

        let mut ids: Vec<String> = reviews
            .values()
            .filter(|r| r.is_visible)
            .map(|r| r.movie_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn count_visible_by_movie(&self, movie_id: &str) -> AppResult<i64> {
        let reviews = self.reviews.read().await;

        Ok(reviews
            .values()
            .filter(|r| r.is_visible && r.movie_id == movie_id)
            .count() as i64)
    }
}
