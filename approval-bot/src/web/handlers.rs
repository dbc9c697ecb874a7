//! Endpoint handlers.
//!
//! Every handler runs after [`verify_slack_request`](super::middleware::verify_slack_request)
//! has accepted the request. Each does one piece of work against the
//! messaging platform and answers within Slack's three second window.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::approval::{
    open_approval_modal, Dispatcher, InteractionForm, InteractionPayload, SlashCommandForm,
};
use crate::slack::MessagingPlatform;
use crate::web::signature::Authenticator;
use crate::Config;

/// Slash command that opens the approval modal.
pub const APPROVAL_COMMAND: &str = "/approval-test";

/// Slash command that reports the bot is alive.
pub const CHECK_COMMAND: &str = "/checkbotworking";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub platform: Arc<dyn MessagingPlatform>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config, platform: Arc<dyn MessagingPlatform>) -> Self {
        let authenticator =
            Authenticator::new(config.slack_signing_secret, config.signature_max_age);

        Self {
            authenticator: Arc::new(authenticator),
            platform,
            dispatcher: Arc::new(Dispatcher::approval()),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Root endpoint.
pub async fn root() -> &'static str {
    "Slack Approval Bot is running!"
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Text response used by diagnostic and command endpoints.
#[derive(Serialize)]
pub struct TextResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<&'static str>,
    pub text: &'static str,
}

/// Connectivity check for signed requests.
pub async fn diagnostic(body: String) -> Json<TextResponse> {
    info!(body_length = body.len(), "diagnostic_received");
    Json(TextResponse {
        response_type: None,
        text: "Diagnostic test successful!",
    })
}

// =============================================================================
// Slash Commands
// =============================================================================

/// `/checkbotworking` endpoint.
pub async fn bot_check(Form(form): Form<SlashCommandForm>) -> Response {
    if form.command == CHECK_COMMAND {
        return bot_working().into_response();
    }

    warn!(command = %form.command, "bot_check_invalid_command");
    (StatusCode::BAD_REQUEST, "Invalid command").into_response()
}

fn bot_working() -> Json<TextResponse> {
    Json(TextResponse {
        response_type: Some("in_channel"),
        text: "✅ Bot is working!",
    })
}

/// Dedicated `/approval-test` endpoint.
pub async fn approval_command(
    State(state): State<AppState>,
    Form(form): Form<SlashCommandForm>,
) -> Response {
    info!(user = %form.user_id, command = %form.command, "slash_command_received");
    open_modal(&state, &form.trigger_id).await
}

/// Shared slash command endpoint, routed by command name.
pub async fn slash_command(
    State(state): State<AppState>,
    Form(form): Form<SlashCommandForm>,
) -> Response {
    info!(user = %form.user_id, command = %form.command, "slash_command_received");

    match form.command.as_str() {
        APPROVAL_COMMAND => open_modal(&state, &form.trigger_id).await,
        CHECK_COMMAND => bot_working().into_response(),
        _ => {
            warn!(command = %form.command, "slash_command_unknown");
            (StatusCode::BAD_REQUEST, "Invalid command").into_response()
        }
    }
}

async fn open_modal(state: &AppState, trigger_id: &str) -> Response {
    if trigger_id.trim().is_empty() {
        warn!("slash_command_missing_trigger_id");
        return (StatusCode::BAD_REQUEST, "Missing trigger_id").into_response();
    }

    match open_approval_modal(state.platform.as_ref(), trigger_id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!(error = %e, "approval_modal_open_failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error opening modal").into_response()
        }
    }
}

// =============================================================================
// Interactions
// =============================================================================

#[derive(Serialize)]
struct Challenge {
    challenge: String,
}

fn processing_error() -> Response {
    Json(TextResponse {
        response_type: None,
        text: "Error processing your request. Please try again.",
    })
    .into_response()
}

/// Interactions endpoint: modal submissions and button clicks.
pub async fn interactions(
    State(state): State<AppState>,
    Form(form): Form<InteractionForm>,
) -> Response {
    let Some(raw) = form.payload else {
        warn!("interaction_payload_missing");
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let payload = match InteractionPayload::parse(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "interaction_payload_invalid");
            return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
        }
    };

    info!(kind = payload.kind(), "interaction_received");
    let platform = state.platform.as_ref();

    match payload {
        InteractionPayload::ViewSubmission(submission) => {
            let callback_id = submission.view.callback_id.as_str();
            let Some(handler) = state.dispatcher.view_handler(callback_id) else {
                warn!(callback_id = %callback_id, "view_submission_unhandled");
                return (StatusCode::BAD_REQUEST, "Unhandled view").into_response();
            };

            match handler(platform, &submission).await {
                Ok(response) => Json(response).into_response(),
                Err(e) => {
                    error!(callback_id = %callback_id, error = %e, "view_submission_failed");
                    processing_error()
                }
            }
        }
        InteractionPayload::BlockActions(actions) => {
            let Some(action) = actions.actions.first() else {
                warn!("block_actions_empty");
                return StatusCode::OK.into_response();
            };

            let Some(handler) = state.dispatcher.action_handler(&action.action_id) else {
                warn!(action_id = %action.action_id, "block_action_unhandled");
                return StatusCode::OK.into_response();
            };

            match handler(platform, &actions, action).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(e) => {
                    error!(action_id = %action.action_id, error = %e, "block_action_failed");
                    processing_error()
                }
            }
        }
        InteractionPayload::UrlVerification { challenge } => {
            Json(Challenge { challenge }).into_response()
        }
        InteractionPayload::Unsupported(kind) => {
            warn!(kind = %kind, "interaction_unhandled");
            (StatusCode::BAD_REQUEST, "Unhandled interaction type").into_response()
        }
    }
}

// =============================================================================
// Events API
// =============================================================================

/// Events API envelope.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub event: Option<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Events API endpoint.
pub async fn events(Json(envelope): Json<EventEnvelope>) -> Response {
    if envelope.kind == "url_verification" {
        info!("events_url_verification");
        return Json(Challenge {
            challenge: envelope.challenge.unwrap_or_default(),
        })
        .into_response();
    }

    match &envelope.event {
        Some(event) if event.kind == "app_mention" || event.kind == "message" => {
            info!(
                kind = %event.kind,
                channel = ?event.channel,
                text_length = event.text.as_deref().map(str::len).unwrap_or(0),
                "event_received"
            );
        }
        Some(event) => info!(kind = %event.kind, "event_ignored"),
        None => info!(kind = %envelope.kind, "event_envelope_without_event"),
    }

    StatusCode::OK.into_response()
}
