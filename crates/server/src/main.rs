use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoquiz_core::{
    load_config, validate_config, CountryFactsProvider, GeoDbClient, LocationProvider,
    RestCountriesClient, ScoreHistoryStore, SqliteScoreHistoryStore,
};
use geoquiz_server::api::create_router;
use geoquiz_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("GEOQUIZ_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "geoquiz {} starting (config {})",
        VERSION,
        &config_hash[..16]
    );
    info!("Database path: {:?}", config.database.path);
    info!("Rounds per session: {}", config.game.rounds_per_session);

    // Score history
    let history: Arc<dyn ScoreHistoryStore> = Arc::new(
        SqliteScoreHistoryStore::new(&config.database.path)
            .context("Failed to create score history store")?,
    );
    info!("Score history store initialized");

    // Providers
    let location_provider: Arc<dyn LocationProvider> = Arc::new(
        GeoDbClient::new(config.providers.geodb.clone())
            .context("Failed to create GeoDB client")?,
    );
    info!("GeoDB client initialized");

    let facts_provider: Arc<dyn CountryFactsProvider> = Arc::new(
        RestCountriesClient::new(config.providers.countries.clone())
            .context("Failed to create REST Countries client")?,
    );
    info!("REST Countries client initialized");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        history,
        location_provider,
        facts_provider,
    ));

    // Evict sessions clients walked away from
    let sweeper_handle = tokio::spawn(Arc::clone(&state).run_session_sweeper());
    info!(
        "Session sweeper started (idle {}s, completed {}s)",
        config.server.session_idle_secs, config.server.completed_session_secs
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper_handle.abort();
    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
