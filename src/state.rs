use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::users::{
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
    services::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub config: Arc<AppConfig>,
    /// Held so the pool can be closed on shutdown. `None` for the in-memory store.
    pub db: Option<PgPool>,
}

impl AppState {
    /// Opens the store described by `config` and runs pending migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let Some(db_cfg) = config.database.as_ref() else {
            tracing::info!("using in-memory user store");
            return Ok(Self::from_parts(Arc::new(MemoryUserStore::new()), config, None));
        };

        let db = PgPoolOptions::new()
            .max_connections(db_cfg.max_connections)
            .connect(&db_cfg.url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        Ok(Self::from_parts(store, config, Some(db)))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>, db: Option<PgPool>) -> Self {
        Self {
            users: UserService::new(store),
            config,
            db,
        }
    }

    /// Releases the database pool, if any.
    pub async fn close(&self) {
        if let Some(db) = &self.db {
            db.close().await;
            tracing::info!("database pool closed");
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database: None,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(Arc::new(MemoryUserStore::new()), config, None)
    }
}
