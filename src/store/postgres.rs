use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{validate_review_fields, Review};

use super::{ExploreFilter, ExplorePage, FeedSort, LikeState, ReviewStore, UserReviews, UserSort};

const REVIEW_COLUMNS: &str =
    "id, movie_id, user_id, rating, comment, likes, likes_count, is_visible, created_at, updated_at";

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Durable review store backed by PostgreSQL.
///
/// The like toggle is a single conditional UPDATE, so the membership array
/// and the denormalized counter change in one atomic row write; concurrent
/// toggles on the same review serialize at the row level.
#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_owned(&self, user_id: Uuid, movie_id: &str) -> AppResult<Option<Uuid>> {
        let row = sqlx::query("SELECT id FROM reviews WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("id")?)),
            None => Ok(None),
        }
    }
}

fn row_to_review(row: &PgRow) -> Result<Review, sqlx::Error> {
    Ok(Review {
        id: row.try_get("id")?,
        movie_id: row.try_get("movie_id")?,
        user_id: row.try_get("user_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        likes: row.try_get("likes")?,
        likes_count: row.try_get("likes_count")?,
        is_visible: row.try_get("is_visible")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found".to_string())
}

fn user_sort_clause(sort: UserSort) -> &'static str {
    match sort {
        UserSort::Recent => "created_at DESC, id ASC",
        UserSort::Oldest => "created_at ASC, id ASC",
        UserSort::RatingDesc => "rating DESC, created_at DESC, id ASC",
        UserSort::RatingAsc => "rating ASC, created_at DESC, id ASC",
        UserSort::TitleAsc => "movie_id ASC, created_at DESC, id ASC",
        UserSort::TitleDesc => "movie_id DESC, created_at DESC, id ASC",
    }
}

fn feed_sort_clause(sort: FeedSort) -> &'static str {
    match sort {
        FeedSort::Popular => "likes_count DESC, created_at DESC, id ASC",
        FeedSort::Recent => "created_at DESC, id ASC",
    }
}

fn push_explore_predicate(qb: &mut QueryBuilder<'_, Postgres>, filter: &ExploreFilter) {
    qb.push(" WHERE is_visible = TRUE AND user_id <> ");
    qb.push_bind(filter.requester_id);
    if let Some(movie_id) = &filter.movie_id {
        qb.push(" AND movie_id = ");
        qb.push_bind(movie_id.clone());
    }
    if let Some(author_ids) = &filter.author_ids {
        qb.push(" AND user_id = ANY(");
        qb.push_bind(author_ids.clone());
        qb.push(")");
    }
}

#[async_trait::async_trait]
impl ReviewStore for PgReviewStore {
    async fn create(
        &self,
        user_id: Uuid,
        movie_id: &str,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review> {
        let comment = validate_review_fields(rating, comment)?;

        if let Some(existing_id) = self.find_owned(user_id, movie_id).await? {
            return Err(AppError::DuplicateReview {
                movie_id: movie_id.to_string(),
                existing_review_id: existing_id,
            });
        }

        let insert = sqlx::query(&format!(
            "INSERT INTO reviews (id, movie_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(movie_id)
        .bind(user_id)
        .bind(rating)
        .bind(&comment)
        .fetch_one(&self.pool)
        .await;

        match insert {
            Ok(row) => Ok(row_to_review(&row)?),
            // Lost a create/create race; report the winner's id.
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                let existing_id = self
                    .find_owned(user_id, movie_id)
                    .await?
                    .ok_or_else(review_not_found)?;
                Err(AppError::DuplicateReview {
                    movie_id: movie_id.to_string(),
                    existing_review_id: existing_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        user_id: Uuid,
        movie_id: &str,
        rating: i32,
        comment: &str,
    ) -> AppResult<Review> {
        let comment = validate_review_fields(rating, comment)?;

        let row = sqlx::query(&format!(
            "UPDATE reviews SET rating = $1, comment = $2, updated_at = NOW() \
             WHERE user_id = $3 AND movie_id = $4 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(rating)
        .bind(&comment)
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(review_not_found)?;

        Ok(row_to_review(&row)?)
    }

    async fn delete(&self, user_id: Uuid, movie_id: &str) -> AppResult<Uuid> {
        let row = sqlx::query("DELETE FROM reviews WHERE user_id = $1 AND movie_id = $2 RETURNING id")
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(review_not_found)?;

        Ok(row.try_get("id")?)
    }

    async fn list_by_user(&self, user_id: Uuid, sort: UserSort) -> AppResult<UserReviews> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 ORDER BY {}",
            user_sort_clause(sort)
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let reviews = rows
            .iter()
            .map(row_to_review)
            .collect::<Result<Vec<_>, _>>()?;

        let mut movie_ids = Vec::new();
        for review in &reviews {
            if !movie_ids.contains(&review.movie_id) {
                movie_ids.push(review.movie_id.clone());
            }
        }

        Ok(UserReviews { reviews, movie_ids })
    }

    async fn list_by_movie(&self, movie_id: &str) -> AppResult<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE movie_id = $1 \
             ORDER BY created_at DESC, id ASC"
        ))
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(row_to_review)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn toggle_like(&self, review_id: Uuid, user_id: Uuid) -> AppResult<LikeState> {
        // One conditional write; RETURNING sees the post-update row, so the
        // reported state is exactly what was persisted.
        let row = sqlx::query(
            "UPDATE reviews SET \
               likes = CASE WHEN $2 = ANY(likes) \
                 THEN array_remove(likes, $2) ELSE array_append(likes, $2) END, \
               likes_count = CASE WHEN $2 = ANY(likes) \
                 THEN likes_count - 1 ELSE likes_count + 1 END \
             WHERE id = $1 \
             RETURNING likes_count, $2 = ANY(likes) AS has_liked",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(review_not_found)?;

        Ok(LikeState {
            likes_count: row.try_get("likes_count")?,
            has_liked: row.try_get("has_liked")?,
        })
    }

    async fn like_state(&self, review_id: Uuid, user_id: Uuid) -> AppResult<LikeState> {
        let row = sqlx::query(
            "SELECT likes_count, $2 = ANY(likes) AS has_liked FROM reviews WHERE id = $1",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(review_not_found)?;

        Ok(LikeState {
            likes_count: row.try_get("likes_count")?,
            has_liked: row.try_get("has_liked")?,
        })
    }

    async fn explore(&self, filter: &ExploreFilter) -> AppResult<ExplorePage> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) AS total FROM reviews");
        push_explore_predicate(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let mut page_query =
            QueryBuilder::new(format!("SELECT {REVIEW_COLUMNS} FROM reviews"));
        push_explore_predicate(&mut page_query, filter);
        page_query.push(format!(" ORDER BY {}", feed_sort_clause(filter.sort)));
        page_query.push(" LIMIT ");
        page_query.push_bind(filter.limit);
        page_query.push(" OFFSET ");
        page_query.push_bind(filter.offset);

        let rows = page_query.build().fetch_all(&self.pool).await?;
        let reviews = rows
            .iter()
            .map(row_to_review)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExplorePage { reviews, total })
    }

    async fn distinct_visible_movie_ids(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT movie_id FROM reviews WHERE is_visible = TRUE ORDER BY movie_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("movie_id").map_err(AppError::from))
            .collect()
    }

    async fn count_visible_by_movie(&self, movie_id: &str) -> AppResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM reviews WHERE is_visible = TRUE AND movie_id = $1",
        )
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("total")?)
    }
}
