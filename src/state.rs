use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::{JwtKeys, SessionAuthenticator},
    catalog::{MovieCatalog, TmdbClient},
    config::AppConfig,
    error::{ApiError, AppError},
    messages::Messages,
    store::{MemoryStore, PgStore, Store},
};

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub messages: Arc<Messages>,
    pub sessions: Arc<SessionAuthenticator>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = if config.database_url == MEMORY_DATABASE_URL {
            warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        } else {
            let pg = PgStore::connect(&config.database_url)
                .await
                .context("connect to database")?;
            if let Err(e) = pg.migrate().await {
                warn!(error = %e, "migration failed; continuing");
            }
            info!("connected to postgres");
            Arc::new(pg)
        };

        let catalog = Arc::new(TmdbClient::new(&config.catalog).context("build catalog client")?)
            as Arc<dyn MovieCatalog>;
        let messages =
            Arc::new(Messages::load(&config.messages_path).context("load message catalog")?);

        Ok(Self::from_parts(config, store, catalog, messages))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn Store>,
        catalog: Arc<dyn MovieCatalog>,
        messages: Arc<Messages>,
    ) -> Self {
        let sessions = Arc::new(SessionAuthenticator::new(
            JwtKeys::from_config(&config.jwt),
            store.clone(),
        ));
        Self {
            config,
            store,
            catalog,
            messages,
            sessions,
        }
    }

    /// Renders a domain error with this state's message catalog.
    pub fn reject(&self, err: AppError) -> ApiError {
        err.render(&self.messages)
    }
}
