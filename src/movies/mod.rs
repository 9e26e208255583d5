use crate::state::AppState;
use axum::Router;

pub mod cache;
mod dto;
pub mod handlers;
pub mod ranker;

pub fn router() -> Router<AppState> {
    handlers::movie_routes()
}
