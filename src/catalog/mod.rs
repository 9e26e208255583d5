//! Third-party movie metadata provider.

use async_trait::async_trait;
use thiserror::Error;

use crate::store::Movie;

mod tmdb;

pub use tmdb::TmdbClient;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("movie not found in catalog")]
    NotFound,
    #[error("catalog responded with status {0}")]
    Status(u16),
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn movie(&self, id: i64) -> Result<Movie, CatalogError>;
    async fn search(&self, keyword: &str) -> Result<Vec<Movie>, CatalogError>;
    async fn popular(&self) -> Result<Vec<Movie>, CatalogError>;
}
