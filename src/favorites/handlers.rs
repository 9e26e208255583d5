use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{AddFavoriteRequest, FavoriteMovie},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    dto::MessageResponse,
    error::ApiError,
    movies::ranker::rank,
    state::AppState,
    validation::{check_movie_id, JsonBody},
};

pub fn favorite_routes() -> Router<AppState> {
    Router::new().route("/favorites", get(list_favorites).post(add_favorite))
}

#[instrument(skip(state, claims, payload), fields(user_id = %claims.sub))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(payload): JsonBody<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let movie_id = check_movie_id(&payload.movie_id).map_err(|e| state.reject(e))?;
    services::add_favorite(
        state.store.as_ref(),
        state.catalog.as_ref(),
        claims.sub,
        movie_id,
    )
    .await
    .map_err(|e| state.reject(e))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: state.messages.get("success.favorites.added"),
        }),
    ))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<FavoriteMovie>>, ApiError> {
    let movies = services::list_favorites(state.store.as_ref(), claims.sub)
        .await
        .map_err(|e| state.reject(e))?;

    let ranked = rank(movies, &mut rand::thread_rng())
        .into_iter()
        .map(|s| FavoriteMovie {
            movie: s.item,
            suggestion_for_today_score: s.score,
        })
        .collect();
    Ok(Json(ranked))
}
