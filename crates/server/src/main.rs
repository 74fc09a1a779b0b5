mod bootstrap;
mod health;
mod recommendations;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use curio_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use curio_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = app.router();

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "curio-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let drain_signal = Arc::clone(&shutdown);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { drain_signal.notified().await })
            .await
    });

    tokio::select! {
        finished = &mut server => {
            finished??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "curio-server draining in-flight requests"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(finished) => finished??,
        Err(_) => warn!(
            event_name = "system.server.drain_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not finish within the grace period"
        ),
    }

    app.db_pool.close().await;
    info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "curio-server stopped"
    );

    Ok(())
}
