//! dramawave-server - DramaWave backend
//!
//! Serves the catalog, comments, notifications, chat, stickers and the
//! daily recommendation card over HTTP, with an SSE change stream.

use anyhow::{Context, Result};
use clap::Parser;
use dramawave_common::config::RootFolderInitializer;
use dramawave_common::db::init_database;
use dramawave_server::config::{Cli, ServerConfig};
use dramawave_server::services::users::bootstrap_admins;
use dramawave_server::{build_router, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting DramaWave server (dramawave-server) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .with_context(|| format!("creating root folder {}", config.root_folder.display()))?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    bootstrap_admins(&pool, &config.bootstrap_admins).await?;

    if config.recommendation.endpoint.is_none() {
        info!("Recommendation endpoint not configured, daily card disabled");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool, config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {}", bind_address))?;
    info!("dramawave-server listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
