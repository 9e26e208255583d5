use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    cache::search_or_popular,
    dto::{SearchQuery, SuggestedMovie},
    ranker::rank,
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, AppError, FieldError},
    state::AppState,
    validation::normalize_search,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new().route("/movies", get(list_movies))
}

/// GET /movies?search=<keyword>
#[instrument(skip(state, _user, query))]
pub async fn list_movies(
    State(state): State<AppState>,
    _user: AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<SuggestedMovie>>, ApiError> {
    let Query(query) = query.map_err(|_| {
        state.reject(AppError::Validation(vec![FieldError::new(
            "search",
            "errors.auth.invalidSearchQuery",
        )]))
    })?;
    let keyword = normalize_search(query.search);

    let movies = search_or_popular(state.catalog.as_ref(), keyword.as_deref())
        .await
        .map_err(|e| state.reject(e))?;

    let ranked = rank(movies, &mut rand::thread_rng())
        .into_iter()
        .map(|s| SuggestedMovie {
            movie: s.item,
            suggestion_score: s.score,
        })
        .collect();
    Ok(Json(ranked))
}
