//! Gradeway - LTI gateway to xAPI learning records

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gradeway::{config::Args, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gradeway={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Gradeway - xAPI Records for LTI");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("LRS endpoint: {}", args.lrs_endpoint);
    info!("LTI 1.1 consumer key: {}", args.lti_consumer_key);
    info!(
        "LTI 1.3: {}",
        if args.lti13_configured() {
            "configured"
        } else {
            "not configured (1.1 only)"
        }
    );
    info!("Session lifetime: {}s", args.session_lifetime_seconds);
    info!("======================================");

    let state = Arc::new(AppState::new(args));

    server::run(state).await?;

    Ok(())
}
