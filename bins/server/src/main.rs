//! ICP API Server
//!
//! Serves on-demand ICP generation, appends and workbook downloads.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use icp_api::{AppState, create_router};
use icp_db::connect;
use icp_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "icp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(
        save_dir = %config.icp.save_dir.display(),
        vat_note = config.vat_note.enabled,
        "ICP output configured"
    );

    // Create application state
    let state = AppState::new(db, config)?;

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
