use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Review, ReviewView};
use crate::services::{ExploreParams, DEFAULT_SEARCH_LIMIT};
use crate::state::AppState;
use crate::store::UserSort;

use super::success;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review).get(reviews_by_movie))
        .route("/user", get(user_reviews))
        .route("/explore", get(explore))
        .route("/search-movies", get(search_movies))
        .route("/:id", put(update_review).delete(delete_review))
        .route("/:id/like", post(toggle_like))
        .route("/:id/hasLiked", get(has_liked))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserReviewsQuery {
    sort_by: Option<UserSort>,
}

/// The requester's own reviews plus the distinct movies they cover.
async fn user_reviews(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<UserReviewsQuery>,
) -> AppResult<Json<Value>> {
    let listing = state
        .store
        .list_by_user(user.id, params.sort_by.unwrap_or_default())
        .await?;

    let reviews: Vec<ReviewView> = listing.reviews.iter().map(ReviewView::from).collect();
    Ok(success(
        &format!("Found {} reviews", reviews.len()),
        json!({ "reviews": reviews, "movieIds": listing.movie_ids }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReviewBody {
    movie_id: Option<String>,
    rating: Option<i32>,
    comment: Option<String>,
}

async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateReviewBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let movie_id = body.movie_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (Some(movie_id), Some(rating), Some(comment)) = (movie_id, body.rating, &body.comment)
    else {
        return Err(AppError::validation(
            "Incomplete data",
            json!({
                "movieId": if movie_id.is_none() { Some("Movie ID is required") } else { None },
                "rating": if body.rating.is_none() { Some("Rating is required") } else { None },
                "comment": if body.comment.is_none() { Some("Comment is required") } else { None },
            }),
        ));
    };

    let review = state.store.create(user.id, movie_id, rating, comment).await?;
    let view = ReviewView::from(&review).with_author(Some(user.profile()));

    Ok((
        StatusCode::CREATED,
        success("Review created successfully", json!(view)),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieReviewsQuery {
    movie_id: Option<String>,
}

/// Reviews for one movie; open to anonymous requesters.
async fn reviews_by_movie(
    State(state): State<AppState>,
    Query(params): Query<MovieReviewsQuery>,
) -> AppResult<Json<Value>> {
    let Some(movie_id) = params.movie_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    else {
        return Err(AppError::validation(
            "Movie ID is required",
            json!({ "movieId": "This field is required" }),
        ));
    };

    let reviews = state.store.list_by_movie(movie_id).await?;
    let views = attach_authors(&state, &reviews).await?;

    Ok(success(
        &format!("Found {} reviews for this movie", views.len()),
        json!(views),
    ))
}

async fn attach_authors(state: &AppState, reviews: &[Review]) -> AppResult<Vec<ReviewView>> {
    let mut author_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
    author_ids.sort();
    author_ids.dedup();
    let profiles = state.directory.profiles(&author_ids).await?;

    Ok(reviews
        .iter()
        .map(|review| {
            ReviewView::from(review).with_author(profiles.get(&review.user_id).cloned())
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct UpdateReviewBody {
    rating: Option<i32>,
    comment: Option<String>,
}

async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(movie_id): Path<String>,
    Json(body): Json<UpdateReviewBody>,
) -> AppResult<Json<Value>> {
    let (Some(rating), Some(comment)) = (body.rating, &body.comment) else {
        return Err(AppError::validation(
            "Incomplete data",
            json!({
                "rating": if body.rating.is_none() { Some("Rating is required") } else { None },
                "comment": if body.comment.is_none() { Some("Comment is required") } else { None },
            }),
        ));
    };

    let review = state.store.update(user.id, &movie_id, rating, comment).await?;
    let view = ReviewView::from(&review).with_author(Some(user.profile()));

    Ok(success("Review updated successfully", json!(view)))
}

async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Value>> {
    let review_id = state.store.delete(user.id, &movie_id).await?;

    Ok(success(
        "Review deleted successfully",
        json!({ "movieId": movie_id, "reviewId": review_id }),
    ))
}

/// Paginated feed of other users' visible reviews.
async fn explore(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ExploreParams>,
) -> AppResult<Json<Value>> {
    let page = state.feed.explore(user.id, &params).await?;

    let message = if page.reviews.is_empty() {
        "No reviews available"
    } else {
        "Reviews found"
    };
    Ok(success(message, json!(page)))
}

async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(review_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let like = state.store.toggle_like(review_id, user.id).await?;

    let message = if like.has_liked {
        "Like added!"
    } else {
        "Like removed"
    };
    Ok(success(message, json!(like)))
}

async fn has_liked(
    State(state): State<AppState>,
    user: AuthUser,
    Path(review_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let like = state.store.like_state(review_id, user.id).await?;
    Ok(success("Like status", json!(like)))
}

#[derive(Debug, Deserialize)]
struct SearchMoviesQuery {
    query: Option<String>,
}

/// Review-driven movie search: reviewed movies whose titles match the query,
/// ranked by review count.
async fn search_movies(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchMoviesQuery>,
) -> AppResult<Json<Value>> {
    let Some(query) = params.query.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(AppError::validation(
            "Search query is required",
            json!({ "query": "This field is required" }),
        ));
    };

    let movies = state.correlator.search(query, DEFAULT_SEARCH_LIMIT).await?;
    Ok(Json(json!({ "movies": movies })))
}
