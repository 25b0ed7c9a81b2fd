use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::UserProfile;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// One user's rating and comment for one externally-identified movie.
///
/// `likes_count` is denormalized from `likes` for cheap popularity sorting;
/// the two are only ever changed together by the store's atomic toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,
    /// Opaque key of the movie in the external metadata provider
    pub movie_id: String,
    /// Owner; immutable after creation
    pub user_id: Uuid,
    /// Star rating, 1 to 5
    pub rating: i32,
    pub comment: String,
    /// Set of user ids that liked this review (no duplicates)
    pub likes: Vec<Uuid>,
    pub likes_count: i64,
    /// Gates feed inclusion only, not ownership CRUD
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: Uuid, movie_id: String, rating: i32, comment: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            movie_id,
            user_id,
            rating,
            comment,
            likes: Vec::new(),
            likes_count: 0,
            is_visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_liked(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}

/// Validates rating range and comment content for create/update.
///
/// Returns the trimmed comment on success.
pub fn validate_review_fields(rating: i32, comment: &str) -> AppResult<String> {
    let trimmed = comment.trim();
    let rating_ok = (MIN_RATING..=MAX_RATING).contains(&rating);
    if rating_ok && !trimmed.is_empty() {
        return Ok(trimmed.to_string());
    }

    let details = json!({
        "rating": if rating_ok {
            None
        } else {
            Some(format!("Rating must be between {} and {}", MIN_RATING, MAX_RATING))
        },
        "comment": if trimmed.is_empty() {
            Some("Comment cannot be empty")
        } else {
            None
        },
    });
    Err(AppError::validation("Invalid review data", details))
}

/// Wire representation of a review.
///
/// The raw `likes` membership list never leaves the server; clients only see
/// the count and, when a requester is known, their own like status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub movie_id: String,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub likes_count: i64,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_liked: Option<bool>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            movie_id: review.movie_id.clone(),
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment.clone(),
            likes_count: review.likes_count,
            is_visible: review.is_visible,
            created_at: review.created_at,
            updated_at: review.updated_at,
            user: None,
            has_liked: None,
        }
    }
}

impl ReviewView {
    pub fn with_author(mut self, author: Option<UserProfile>) -> Self {
        self.user = author;
        self
    }

    pub fn with_has_liked(mut self, has_liked: bool) -> Self {
        self.has_liked = Some(has_liked);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_review_starts_unliked_and_visible() {
        let review = Review::new(Uuid::new_v4(), "603".to_string(), 5, "Classic".to_string());
        assert!(review.likes.is_empty());
        assert_eq!(review.likes_count, 0);
        assert!(review.is_visible);
        assert_eq!(review.created_at, review.updated_at);
    }

    #[test]
    fn test_validate_accepts_rating_bounds() {
        assert!(validate_review_fields(1, "ok").is_ok());
        assert!(validate_review_fields(5, "ok").is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_rating() {
        assert!(validate_review_fields(0, "ok").is_err());
        assert!(validate_review_fields(6, "ok").is_err());
    }

    #[test]
    fn test_validate_rejects_blank_comment() {
        assert!(validate_review_fields(3, "   ").is_err());
    }

    #[test]
    fn test_validate_trims_comment() {
        let comment = validate_review_fields(3, "  great movie  ").unwrap();
        assert_eq!(comment, "great movie");
    }

    #[test]
    fn test_view_never_serializes_raw_likes() {
        let mut review = Review::new(Uuid::new_v4(), "603".to_string(), 4, "Nice".to_string());
        review.likes.push(Uuid::new_v4());
        review.likes_count = 1;

        let json = serde_json::to_value(ReviewView::from(&review)).unwrap();
        assert!(json.get("likes").is_none());
        assert_eq!(json["likesCount"], 1);
    }
}
