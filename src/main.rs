//! Retail Server - multi-tenant retail management backend
//!
//! This is the main entry point for the server. It handles:
//! - HTTP endpoints for sellers, products, customers and invoices
//! - AI-assisted product descriptions, pricing and inventory import
//! - Appwrite integration for accounts and document storage
//!
//! Run `retail_server setup` once to create the database schema.

mod ai;
mod app;
mod config;
mod http;
mod store;
mod usecases;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;
use crate::store::AppwriteClient;
use crate::util::rate_limit::SellerRateLimiter;
use crate::util::time::init_server_time;

/// How often idle sellers are dropped from the AI limiter
const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    if std::env::args().nth(1).as_deref() == Some("setup") {
        info!(database = %config.appwrite_database_id, "Applying database schema");
        store::schema::apply(&AppwriteClient::new(&config)).await?;
        info!("Schema setup complete");
        return Ok(());
    }

    // Initialize server time tracking
    init_server_time();

    info!("Starting Retail Server");
    info!("Server address: {}", config.server_addr);

    // Create application state
    let state = AppState::new(config.clone());
    match state.ai.as_ref() {
        Some(ai) => info!(provider = %ai.provider(), "AI assistant enabled"),
        None => warn!(provider = %config.ai_provider, "No AI API key set, AI endpoints disabled"),
    }

    spawn_limiter_pruning(state.ai_limiter.clone());

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn spawn_limiter_pruning(limiter: SellerRateLimiter) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.prune();
            debug!(tracked = limiter.tracked_sellers(), "Pruned AI rate limiter");
        }
    });
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
