use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Movie, NewUser, Store, StoreError, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    movies: BTreeMap<i64, Movie>,
    favorites: HashSet<(i64, Uuid)>,
    revoked: HashSet<String>,
}

/// In-process backend with the same uniqueness and reference rules as the
/// SQL schema. Selected with `DATABASE_URL=memory://`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".into()))
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn movie_count(&self) -> usize {
        self.lock().map(|t| t.movies.len()).unwrap_or_default()
    }

    pub fn favorite_count(&self, user_id: Uuid) -> usize {
        self.lock()
            .map(|t| t.favorites.iter().filter(|(_, u)| *u == user_id).count())
            .unwrap_or_default()
    }

    /// Removes the user and, like the SQL cascade, every favorite they own.
    pub fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        let user = t.users.remove(&id).ok_or(StoreError::NotFound)?;
        t.emails.remove(&user.email);
        t.favorites.retain(|(_, u)| *u != id);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut t = self.lock()?;
        if t.emails.contains_key(&user.email) || t.users.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists);
        }
        let row = User {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: user.password_hash.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.emails.insert(row.email.clone(), row.id);
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let t = self.lock()?;
        t.emails
            .get(email)
            .and_then(|id| t.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.lock()?
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn revoke_token(&self, token: &str) -> Result<(), StoreError> {
        if self.lock()?.revoked.insert(token.to_string()) {
            Ok(())
        } else {
            Err(StoreError::AlreadyExists)
        }
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.revoked.contains(token))
    }

    async fn find_movie(&self, id: i64) -> Result<Movie, StoreError> {
        self.lock()?
            .movies
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_movie_if_absent(&self, movie: &Movie) -> Result<(), StoreError> {
        self.lock()?
            .movies
            .entry(movie.id)
            .or_insert_with(|| movie.clone());
        Ok(())
    }

    async fn add_favorite(&self, user_id: Uuid, movie_id: i64) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        if !t.users.contains_key(&user_id) || !t.movies.contains_key(&movie_id) {
            return Err(StoreError::NotFound);
        }
        if t.favorites.insert((movie_id, user_id)) {
            Ok(())
        } else {
            Err(StoreError::AlreadyExists)
        }
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Movie>, StoreError> {
        let t = self.lock()?;
        Ok(t.movies
            .values()
            .filter(|m| t.favorites.contains(&(m.id, user_id)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) fn sample_movie(id: i64, title: &str) -> Movie {
    Movie {
        id,
        adult: false,
        backdrop_path: None,
        genre_ids: vec![18],
        original_language: Some("en".into()),
        original_title: Some(title.into()),
        overview: Some(format!("{title} overview")),
        popularity: Some(10.0),
        poster_path: None,
        release_date: Some("1999-10-15".into()),
        title: title.into(),
        video: false,
        vote_average: Some(8.4),
        vote_count: Some(100),
    }
}
