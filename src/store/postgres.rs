use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use super::{Movie, NewUser, Store, StoreError, User};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct MovieRow {
    id: i64,
    adult: bool,
    backdrop_path: Option<String>,
    genre_ids: Json<Vec<i64>>,
    original_language: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    popularity: Option<f64>,
    poster_path: Option<String>,
    release_date: Option<String>,
    title: String,
    video: bool,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

impl From<MovieRow> for Movie {
    fn from(r: MovieRow) -> Self {
        Self {
            id: r.id,
            adult: r.adult,
            backdrop_path: r.backdrop_path,
            genre_ids: r.genre_ids.0,
            original_language: r.original_language,
            original_title: r.original_title,
            overview: r.overview,
            popularity: r.popularity,
            poster_path: r.poster_path,
            release_date: r.release_date,
            title: r.title,
            video: r.video,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
        }
    }
}

const MOVIE_COLUMNS: &str = "m.id, m.adult, m.backdrop_path, m.genre_ids, m.original_language, \
     m.original_title, m.overview, m.popularity, m.poster_path, m.release_date, m.title, \
     m.video, m.vote_average, m.vote_count";

/// Classifies constraint violations; everything else is a backend fault.
fn map_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
        _ => {
            error!(error = %e, "postgres query failed");
            StoreError::Backend(e.to_string())
        }
    }
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, last_name, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn revoke_token(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO revoked_tokens (token) VALUES ($1)")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let (found,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token = $1)")
                .bind(token)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(found)
    }

    async fn find_movie(&self, id: i64) -> Result<Movie, StoreError> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE m.id = $1");
        let row = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.into())
    }

    async fn insert_movie_if_absent(&self, movie: &Movie) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO movies (id, adult, backdrop_path, genre_ids, original_language,
                                original_title, overview, popularity, poster_path,
                                release_date, title, video, vote_average, vote_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(movie.id)
        .bind(movie.adult)
        .bind(&movie.backdrop_path)
        .bind(Json(&movie.genre_ids))
        .bind(&movie.original_language)
        .bind(&movie.original_title)
        .bind(&movie.overview)
        .bind(movie.popularity)
        .bind(&movie.poster_path)
        .bind(&movie.release_date)
        .bind(&movie.title)
        .bind(movie.video)
        .bind(movie.vote_average)
        .bind(movie.vote_count)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn add_favorite(&self, user_id: Uuid, movie_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO favorites (movie_id, user_id) VALUES ($1, $2)")
            .bind(movie_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Movie>, StoreError> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m \
             JOIN favorites f ON m.id = f.movie_id \
             WHERE f.user_id = $1"
        );
        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }
}
