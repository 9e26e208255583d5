use crate::state::AppState;
use axum::Router;

mod claims;
pub mod credentials;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod jwt;
mod password;
pub mod session;

pub use dto::{LoginRequest, RegisterRequest};
pub use jwt::JwtKeys;
pub use session::SessionAuthenticator;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
