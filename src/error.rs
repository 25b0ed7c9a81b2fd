use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{message}")]
    Validation {
        message: String,
        details: serde_json::Value,
    },

    #[error("Already reviewed movie {movie_id}")]
    DuplicateReview {
        movie_id: String,
        existing_review_id: Uuid,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("External API error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure with a per-field detail object for the client.
    pub fn validation(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, message, Some(details))
            }
            AppError::DuplicateReview {
                movie_id,
                existing_review_id,
            } => (
                StatusCode::BAD_REQUEST,
                "You have already reviewed this movie".to_string(),
                Some(json!({
                    "movieId": movie_id,
                    "existingReviewId": existing_review_id,
                })),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::AuthRequired(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg, None),
            AppError::HttpClient(e) => {
                tracing::error!(error = %e, "Upstream HTTP client failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "Error contacting external API".to_string(),
                    None,
                )
            }
            // Internals are logged, never sent to the client.
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Cache(e) => {
                tracing::error!(error = %e, "Cache failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Unexpected internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => json!({
                "status": "error",
                "message": message,
                "details": details,
            }),
            None => json!({
                "status": "error",
                "message": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_review_maps_to_bad_request() {
        let err = AppError::DuplicateReview {
            movie_id: "603".to_string(),
            existing_review_id: Uuid::new_v4(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::NotFound("Review not found".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_required_maps_to_401() {
        let err = AppError::AuthRequired("No token provided".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
