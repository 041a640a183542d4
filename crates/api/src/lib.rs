//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - ICP generation, append and download routes
//! - Health check

pub mod routes;

use axum::Router;
use icp_core::archive::{ArchiveError, VatNoteArchiver};
use icp_core::icp::{IcpService, IcpSettings};
use icp_db::{DeclarationStore, GenerationStore};
use icp_shared::AppConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// ICP service wired to the MySQL repositories.
pub type IcpGenerator = IcpService<DeclarationStore, GenerationStore>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// ICP generation service.
    pub icp: Arc<IcpGenerator>,
}

impl AppState {
    /// Wire services over a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if VAT-note archives are enabled and the HTTP client cannot be built.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self, ArchiveError> {
        let db = Arc::new(db);
        let mut icp = IcpService::new(
            Arc::new(DeclarationStore::new(Arc::clone(&db))),
            Arc::new(GenerationStore::new(Arc::clone(&db))),
            IcpSettings::from_config(&config.icp),
        );
        if let Some(archiver) = VatNoteArchiver::from_config(&config.vat_note)? {
            icp = icp.with_vat_notes(archiver);
        }

        Ok(Self {
            db,
            config: Arc::new(config),
            icp: Arc::new(icp),
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
