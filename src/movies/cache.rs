//! Local snapshot of catalog entries. A movie is fetched at most once;
//! after it is stored it is served from the store and never refreshed.

use tracing::{info, warn};

use crate::{
    catalog::MovieCatalog,
    error::AppError,
    store::{Movie, Store, StoreError},
};

/// Returns the stored movie, fetching and storing it first if needed.
/// Any catalog failure is `MovieNotAvailable`; there is no retry.
pub async fn ensure_cached(
    store: &dyn Store,
    catalog: &dyn MovieCatalog,
    movie_id: i64,
) -> Result<Movie, AppError> {
    match store.find_movie(movie_id).await {
        Ok(movie) => return Ok(movie),
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let fetched = catalog.movie(movie_id).await.map_err(|e| {
        warn!(error = %e, movie_id, "catalog lookup failed");
        AppError::MovieNotAvailable
    })?;
    if fetched.id != movie_id {
        warn!(movie_id, returned_id = fetched.id, "catalog returned a different id");
        return Err(AppError::MovieNotAvailable);
    }

    // a concurrent request may have stored it in the meantime; that row wins
    store.insert_movie_if_absent(&fetched).await?;
    info!(movie_id, "movie cached");
    Ok(store.find_movie(movie_id).await?)
}

/// Keyword search when a keyword is given, the popular listing otherwise.
/// Nothing here touches the store.
pub async fn search_or_popular(
    catalog: &dyn MovieCatalog,
    keyword: Option<&str>,
) -> Result<Vec<Movie>, AppError> {
    let movies = match keyword {
        Some(k) if !k.is_empty() => catalog.search(k).await?,
        _ => catalog.popular().await?,
    };
    Ok(movies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::CatalogError,
        state::testing::FakeCatalog,
        store::{memory::sample_movie, MemoryStore},
    };

    #[tokio::test]
    async fn fetches_once_then_serves_from_store() {
        let store = MemoryStore::new();
        let catalog = FakeCatalog::with_movies([sample_movie(550, "Fight Club")]);

        let first = ensure_cached(&store, &catalog, 550).await.unwrap();
        let second = ensure_cached(&store, &catalog, 550).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.lookups(), 1);
        assert_eq!(store.movie_count(), 1);
    }

    #[tokio::test]
    async fn stored_snapshot_is_never_refreshed() {
        let store = MemoryStore::new();
        store
            .insert_movie_if_absent(&sample_movie(550, "Old Title"))
            .await
            .unwrap();
        let catalog = FakeCatalog::with_movies([sample_movie(550, "New Title")]);

        let movie = ensure_cached(&store, &catalog, 550).await.unwrap();
        assert_eq!(movie.title, "Old Title");
        assert_eq!(catalog.lookups(), 0);
    }

    #[tokio::test]
    async fn catalog_miss_or_outage_is_not_available() {
        let store = MemoryStore::new();
        let catalog = FakeCatalog::default();
        assert!(matches!(
            ensure_cached(&store, &catalog, 999_999_999).await,
            Err(AppError::MovieNotAvailable)
        ));

        let down = FakeCatalog::unavailable();
        assert!(matches!(
            ensure_cached(&store, &down, 550).await,
            Err(AppError::MovieNotAvailable)
        ));
        assert_eq!(store.movie_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_first_fetches_store_one_row() {
        let store = MemoryStore::new();
        let catalog = FakeCatalog::with_movies([sample_movie(550, "Fight Club")]);
        let (a, b) = tokio::join!(
            ensure_cached(&store, &catalog, 550),
            ensure_cached(&store, &catalog, 550)
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.movie_count(), 1);
    }

    /// Answers every lookup with the same record, whatever id was asked for.
    struct WrongIdCatalog;

    #[async_trait::async_trait]
    impl MovieCatalog for WrongIdCatalog {
        async fn movie(&self, _id: i64) -> Result<Movie, CatalogError> {
            Ok(sample_movie(7, "Somebody Else"))
        }
        async fn search(&self, _keyword: &str) -> Result<Vec<Movie>, CatalogError> {
            Ok(Vec::new())
        }
        async fn popular(&self) -> Result<Vec<Movie>, CatalogError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn mismatched_catalog_id_stores_nothing() {
        let store = MemoryStore::new();
        assert!(matches!(
            ensure_cached(&store, &WrongIdCatalog, 550).await,
            Err(AppError::MovieNotAvailable)
        ));
        assert_eq!(store.movie_count(), 0);
        assert!(matches!(store.find_movie(7).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn keyword_picks_search_and_blank_picks_popular() {
        let catalog = FakeCatalog::with_movies([
            sample_movie(1, "The Matrix"),
            sample_movie(2, "Heat"),
        ]);
        let found = search_or_popular(&catalog, Some("matrix")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);

        let popular = search_or_popular(&catalog, None).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(search_or_popular(&catalog, Some("")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn listing_failures_surface_as_upstream() {
        let down = FakeCatalog::unavailable();
        assert!(matches!(
            search_or_popular(&down, None).await,
            Err(AppError::Upstream(_))
        ));
    }
}
