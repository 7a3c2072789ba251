/// TaskVault API
///
/// Main entry point. Loads `.env`, reads configuration from the environment and
/// starts the HTTP server.

use taskvault::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow lifecycle at /workflows/*
/// - Team management at /team/*
/// - Audit feed at /audit-logs and dashboard data at /analytics/overview
/// - Health check at /health
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the real environment still applies
    let _ = dotenvy::dotenv();

    // Load configuration (defaults to 0.0.0.0:8000 and the REST store)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}
