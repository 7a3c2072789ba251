/// Server setup and initialization
///
/// Wires together all components: table store, workflow store, team service,
/// rate limiter, event sink and HTTP routes. Provides the application factory
/// used by `main` and by the integration tests.

use crate::{
    api::{build_router, AppState},
    auth::CallerFlagVerifier,
    config::Config,
    store::build_store,
};
use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the shared application state from configuration
pub fn build_state(config: &Config) -> Result<AppState> {
    tracing::info!("🏗️ Initializing table store");
    let store = build_store(&config.store)?;

    tracing::info!("📋 Initializing workflow store, team service and rate limiter");
    Ok(AppState::new(config, store, Arc::new(CallerFlagVerifier)))
}

/// CORS layer for the configured browser origins
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Create the main Axum application with all routes and middleware
pub fn create_app(config: &Config, state: AppState) -> Router {
    tracing::info!("📡 Creating HTTP router with all endpoints");
    build_router(state)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with the given configuration
///
/// Runs until Ctrl-C, then drains queued audit and usage events.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting TaskVault API...");

    let state = build_state(&config)?;
    let events = state.events.clone();
    let app = create_app(&config, state);

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("📨 Flushing pending events before exit");
    events.flush().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("⏹️ Shutdown signal received");
}
