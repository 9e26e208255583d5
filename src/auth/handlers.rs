use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    credentials,
    dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse},
    extractors::AuthUser,
};
use crate::{
    dto::MessageResponse,
    error::{ApiError, AppError},
    state::AppState,
    store::StoreError,
    validation::{check_login, check_registration, JsonBody},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let registration = check_registration(payload).map_err(|e| state.reject(e))?;
    let user_id = credentials::register(state.store.as_ref(), &registration)
        .await
        .map_err(|e| state.reject(e))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: state.messages.get("success.auth.registered"),
            user_id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    check_login(&payload).map_err(|e| state.reject(e))?;
    let user =
        credentials::verify_credentials(state.store.as_ref(), &payload.email, &payload.password)
            .await
            .map_err(|e| state.reject(e))?;
    let token = state
        .sessions
        .issue_token(user.id, &user.email)
        .map_err(|e| state.reject(e))?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: state.messages.get("success.auth.loggedIn"),
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    state
        .sessions
        .revoke(header)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(MessageResponse {
        message: state.messages.get("success.auth.loggedOut"),
    }))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::UserNotFound,
            other => other.into(),
        })
        .map_err(|e| state.reject(e))?;

    Ok(Json(user.into()))
}
