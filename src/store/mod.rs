//! Persistence seam. Handlers and services only see `dyn Store`; the
//! Postgres and in-process backends enforce the same constraints.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
mod models;
pub mod postgres;

pub use memory::MemoryStore;
pub use models::{Movie, NewUser, User};
pub use postgres::PgStore;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row missing, or a referenced row missing on insert.
    #[error("not found")]
    NotFound,
    /// Unique key already taken.
    #[error("already exists")]
    AlreadyExists,
    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    /// Fails with `AlreadyExists` when the exact token string is already recorded.
    async fn revoke_token(&self, token: &str) -> Result<(), StoreError>;
    async fn is_token_revoked(&self, token: &str) -> Result<bool, StoreError>;

    async fn find_movie(&self, id: i64) -> Result<Movie, StoreError>;
    /// Silently keeps the existing row if the id is already cached.
    async fn insert_movie_if_absent(&self, movie: &Movie) -> Result<(), StoreError>;

    /// `AlreadyExists` on a duplicate pair, `NotFound` if the user or movie row is missing.
    async fn add_favorite(&self, user_id: Uuid, movie_id: i64) -> Result<(), StoreError>;
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Movie>, StoreError>;
}
