use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::{CatalogError, MovieCatalog};
use crate::{config::CatalogConfig, store::Movie};

/// HTTP client for The Movie Database v3 API.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct Genre {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    #[serde(default)]
    adult: bool,
    backdrop_path: Option<String>,
    // list endpoints send `genre_ids`, the detail endpoint sends `genres`
    genre_ids: Option<Vec<i64>>,
    genres: Option<Vec<Genre>>,
    original_language: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    popularity: Option<f64>,
    poster_path: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    video: bool,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

impl From<TmdbMovie> for Movie {
    fn from(m: TmdbMovie) -> Self {
        let genre_ids = m
            .genre_ids
            .or_else(|| m.genres.map(|g| g.into_iter().map(|g| g.id).collect()))
            .unwrap_or_default();
        Self {
            id: m.id,
            adult: m.adult,
            backdrop_path: m.backdrop_path,
            genre_ids,
            original_language: m.original_language,
            original_title: m.original_title,
            overview: m.overview,
            popularity: m.popularity,
            poster_path: m.poster_path,
            release_date: m.release_date,
            title: m.title,
            video: m.video,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    results: Vec<TmdbMovie>,
}

impl TmdbClient {
    pub fn new(cfg: &CatalogConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            language: cfg.language.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .query(&[("language", self.language.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, %path, "catalog request failed");
                CatalogError::Transport(e.to_string())
            })?;

        let status = res.status();
        debug!(%path, %status, "catalog responded");
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        res.json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn movie(&self, id: i64) -> Result<Movie, CatalogError> {
        let m: TmdbMovie = self.get_json(&format!("/movie/{id}"), &[]).await?;
        Ok(m.into())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Movie>, CatalogError> {
        let page: Page = self
            .get_json("/search/movie", &[("query", keyword), ("page", "1")])
            .await?;
        Ok(page.results.into_iter().map(Movie::from).collect())
    }

    async fn popular(&self) -> Result<Vec<Movie>, CatalogError> {
        let page: Page = self.get_json("/movie/popular", &[("page", "1")]).await?;
        Ok(page.results.into_iter().map(Movie::from).collect())
    }
}
