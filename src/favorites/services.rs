use tracing::info;
use uuid::Uuid;

use crate::{
    catalog::MovieCatalog,
    error::AppError,
    movies::cache::ensure_cached,
    store::{Movie, Store, StoreError},
};

/// Checks the user, caches the movie if needed, then records the pair.
/// The user check comes first so an unknown user never triggers a fetch.
pub async fn add_favorite(
    store: &dyn Store,
    catalog: &dyn MovieCatalog,
    user_id: Uuid,
    movie_id: i64,
) -> Result<(), AppError> {
    match store.find_user_by_id(user_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => return Err(AppError::UserNotFound),
        Err(e) => return Err(e.into()),
    }

    ensure_cached(store, catalog, movie_id).await?;

    match store.add_favorite(user_id, movie_id).await {
        Ok(()) => {
            info!(%user_id, movie_id, "favorite added");
            Ok(())
        }
        Err(StoreError::AlreadyExists) => Err(AppError::AlreadyFavorited),
        Err(StoreError::NotFound) => Err(missing_reference(store, user_id).await),
        Err(e) => Err(e.into()),
    }
}

/// The user or the movie row vanished between the checks and the insert.
async fn missing_reference(store: &dyn Store, user_id: Uuid) -> AppError {
    match store.find_user_by_id(user_id).await {
        Ok(_) => AppError::MovieNotAvailable,
        Err(StoreError::NotFound) => AppError::UserNotFound,
        Err(e) => e.into(),
    }
}

/// Every favorite of the user, in storage order.
pub async fn list_favorites(store: &dyn Store, user_id: Uuid) -> Result<Vec<Movie>, AppError> {
    Ok(store.list_favorites(user_id).await?)
}
