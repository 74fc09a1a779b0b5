use axum::Router;
use curio_core::config::{AppConfig, ConfigError, LoadOptions};
use curio_core::recommendations::RecommendationEngine;
use curio_db::{connect_with_settings, migrations, DbPool, SqlCatalogStore};
use thiserror::Error;
use tracing::info;

use crate::{health, recommendations};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

impl Application {
    /// Every route the server exposes, sharing one pool.
    pub fn router(&self) -> Router {
        let engine = RecommendationEngine::new(SqlCatalogStore::new(self.db_pool.clone()));
        health::router(self.db_pool.clone()).merge(recommendations::router(engine))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(Application { config, db_pool })
}
