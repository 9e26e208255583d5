use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::claims::SessionClaims;
use crate::{error::ApiError, state::AppState};

/// Authenticated identity of the caller. Rejects with 401 when the bearer
/// token is missing, revoked or invalid.
pub struct AuthUser(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        state
            .sessions
            .authenticate(header)
            .await
            .map(AuthUser)
            .map_err(|e| state.reject(e))
    }
}
