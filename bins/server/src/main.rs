//! Faktura API Server
//!
//! Main entry point for the Faktura backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use faktura_api::{AppState, create_router};
use faktura_db::connect;
use faktura_shared::AppConfig;
use faktura_shared::identity::ProviderVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faktura=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create the identity verifier for the configured provider project
    let verifier = ProviderVerifier::new(config.identity.clone());
    info!(
        project_id = %config.identity.project_id,
        "Identity verifier configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        verifier: Arc::new(verifier),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
