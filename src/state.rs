use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::AppConfig;
use crate::seed::{pg::PgSeedStore, Fixtures, SeedStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SeedStore>,
    pub fixtures: Arc<Fixtures>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // Lazy so that a build with the placeholder url never dials out.
        let options = if config.is_placeholder() {
            PgConnectOptions::new()
        } else {
            config
                .database_url
                .parse::<PgConnectOptions>()
                .context("parse database url")?
        };
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);

        let store = Arc::new(PgSeedStore::new(db)) as Arc<dyn SeedStore>;
        Ok(Self::from_parts(config, store, Arc::new(Fixtures::placeholder())))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn SeedStore>,
        fixtures: Arc<Fixtures>,
    ) -> Self {
        Self {
            config,
            store,
            fixtures,
        }
    }
}
