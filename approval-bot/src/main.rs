//! Approval Bot - Slack approval request server.
//!
//! This binary:
//! - Loads configuration from the environment
//! - Verifies every inbound Slack request against the signing secret
//! - Serves slash commands, interactions and events
//!
//! A missing signing secret does not stop startup; the server then answers
//! every request with a configuration error until the secret is supplied.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use approvalbot::{router, AppState, Config, SlackClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("approval_bot_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        signing_secret_configured = config.has_signing_secret(),
        bot_token_configured = config.has_bot_token(),
        slack_api_base_url = %config.slack_api_base_url,
        signature_max_age = config.signature_max_age,
        "config_loaded"
    );

    if !config.has_signing_secret() {
        error!("signing_secret_missing_all_requests_will_be_rejected");
    }

    // Create Slack client
    let missing_token = SecretString::from(String::new());
    let bot_token = match config.slack_bot_token.as_ref() {
        Some(token) => token,
        None => {
            error!("slack_bot_token_missing");
            &missing_token
        }
    };
    let client = SlackClient::new(
        bot_token,
        config.slack_api_base_url.clone(),
        Duration::from_millis(config.request_timeout_ms),
    )
    .context("Failed to create Slack client")?;

    let port = config.port;
    let state = AppState::new(config, Arc::new(client));
    info!(
        views = ?state.dispatcher.view_callbacks(),
        actions = ?state.dispatcher.action_ids(),
        "dispatch_table_built"
    );

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "ctrl_c_handler_failed");
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
                error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
