//! Web server module for handling Slack requests.
//!
//! This module provides:
//! - Signature verification of every inbound request
//! - Slash command, interaction and event endpoints
//! - The router wiring them together

pub mod handlers;
pub mod middleware;
pub mod signature;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    approval_command, bot_check, diagnostic, events, health, interactions, root, slash_command,
    AppState, HealthResponse,
};
pub use middleware::verify_slack_request;
pub use signature::{Authenticator, SignedRequest, VerificationResult};

/// Build the application router.
///
/// Verification wraps every route; safe methods such as the health checks
/// pass through it without a signature.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/slack/diagnostic", post(diagnostic))
        .route("/slack/bot/check", post(bot_check))
        .route("/slack/commands/approval-test", post(approval_command))
        .route("/slack/command", post(slash_command))
        .route("/slack/interactions", post(interactions))
        .route("/slack/events", post(events))
        .layer(from_fn_with_state(state.clone(), verify_slack_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
