use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::MovieSummary;
use crate::state::AppState;

const DETAIL_POSTER_WIDTH: &str = "w500";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/:id", get(details))
}

#[derive(Debug, Deserialize)]
struct MovieSearchQuery {
    query: Option<String>,
}

/// Free-text search against the metadata provider; anonymous.
async fn search(
    State(state): State<AppState>,
    Query(params): Query<MovieSearchQuery>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let Some(query) = params.query.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(AppError::validation(
            "Search query is required",
            json!({ "query": "This field is required" }),
        ));
    };

    let results = state
        .resolver
        .search(query, &state.config.primary_locale)
        .await?;

    Ok(Json(
        results
            .iter()
            .map(|meta| {
                MovieSummary::from_metadata(meta, &state.config.tmdb_image_url, DETAIL_POSTER_WIDTH)
            })
            .collect(),
    ))
}

/// Single-movie details; the one surface where upstream failure maps to 502.
async fn details(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<MovieSummary>> {
    let meta = state
        .resolver
        .resolve(&movie_id, &state.config.primary_locale)
        .await?;

    Ok(Json(MovieSummary::from_metadata(
        &meta,
        &state.config.tmdb_image_url,
        DETAIL_POSTER_WIDTH,
    )))
}
