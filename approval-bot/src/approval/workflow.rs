//! Approval workflow steps.
//!
//! Each step calls out to the messaging platform in order and stops at the
//! first failure. The `handle_*` functions are the entries registered in the
//! [`Dispatcher`](super::dispatch::Dispatcher).

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::slack::{MessagingPlatform, SlackError};

use super::messages::{
    approver_request, decided_request, decision_notice, requester_confirmation, Decision,
};
use super::payload::{
    first_mention, ActionPayload, ApprovalRequest, BlockActions, ButtonValue, PayloadError,
    ValidationErrors, ViewSubmission,
};
use super::views::approval_modal;

/// Errors raised while handling an interaction.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Slack(#[from] SlackError),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Response body for a modal submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "response_action", rename_all = "snake_case")]
pub enum ViewResponse {
    /// Close the modal.
    Clear,
    /// Keep the modal open and show errors under the named blocks.
    Errors { errors: ValidationErrors },
}

/// List the workspace's users and open the approval modal.
pub async fn open_approval_modal(
    platform: &dyn MessagingPlatform,
    trigger_id: &str,
) -> Result<(), SlackError> {
    let users = platform.list_users().await?;
    let view = approval_modal(&users);
    platform.open_form(trigger_id, &view).await?;

    info!(users = users.len(), "approval_modal_opened");
    Ok(())
}

/// Send the request to the approver, then confirm to the requester.
pub async fn submit_request(
    platform: &dyn MessagingPlatform,
    request: &ApprovalRequest,
) -> Result<(), SlackError> {
    platform
        .post_message(&request.approver_id, &approver_request(request))
        .await?;
    platform
        .post_message(&request.requester_id, &requester_confirmation(request))
        .await?;

    info!(
        requester = %request.requester_id,
        approver = %request.approver_id,
        "approval_request_sent"
    );
    Ok(())
}

/// Tell the requester about a decision and rewrite the approver's message.
pub async fn record_decision(
    platform: &dyn MessagingPlatform,
    decision: Decision,
    approver_id: &str,
    requester_id: &str,
    text: Option<&str>,
    channel: &str,
    ts: &str,
) -> Result<(), SlackError> {
    platform
        .post_message(requester_id, &decision_notice(decision, approver_id, text))
        .await?;
    platform
        .update_message(channel, ts, &decided_request(decision, requester_id, text))
        .await?;

    info!(
        decision = decision.as_str(),
        requester = %requester_id,
        approver = %approver_id,
        "approval_decision_recorded"
    );
    Ok(())
}

// =============================================================================
// Dispatch Entries
// =============================================================================

/// Submission of the approval request modal.
pub fn handle_approval_submission<'a>(
    platform: &'a dyn MessagingPlatform,
    submission: &'a ViewSubmission,
) -> BoxFuture<'a, Result<ViewResponse, HandlerError>> {
    Box::pin(async move {
        let request = match submission.approval_request() {
            Ok(request) => request,
            Err(errors) => {
                warn!(
                    requester = %submission.user.id,
                    errors = ?errors,
                    "approval_submission_invalid"
                );
                return Ok(ViewResponse::Errors { errors });
            }
        };

        submit_request(platform, &request).await?;
        Ok(ViewResponse::Clear)
    })
}

/// The approve button.
pub fn handle_approve<'a>(
    platform: &'a dyn MessagingPlatform,
    actions: &'a BlockActions,
    action: &'a ActionPayload,
) -> BoxFuture<'a, Result<(), HandlerError>> {
    Box::pin(decide(platform, actions, action, Decision::Approved))
}

/// The reject button.
pub fn handle_reject<'a>(
    platform: &'a dyn MessagingPlatform,
    actions: &'a BlockActions,
    action: &'a ActionPayload,
) -> BoxFuture<'a, Result<(), HandlerError>> {
    Box::pin(decide(platform, actions, action, Decision::Rejected))
}

async fn decide(
    platform: &dyn MessagingPlatform,
    actions: &BlockActions,
    action: &ActionPayload,
    decision: Decision,
) -> Result<(), HandlerError> {
    let value = ButtonValue::decode(action.value.as_deref().unwrap_or_default())?;
    let (channel, ts) = actions.message_location()?;

    record_decision(
        platform,
        decision,
        &actions.user.id,
        &value.requester_id,
        Some(&value.approval_text),
        channel,
        ts,
    )
    .await?;
    Ok(())
}

/// Buttons on messages sent before the button value carried the request.
///
/// The decision is the button value (`approve` / `reject`) and the requester
/// is the first user mentioned in the message text.
pub fn handle_legacy_decision<'a>(
    platform: &'a dyn MessagingPlatform,
    actions: &'a BlockActions,
    action: &'a ActionPayload,
) -> BoxFuture<'a, Result<(), HandlerError>> {
    Box::pin(async move {
        let decision = legacy_decision(action);
        let requester_id = actions
            .message
            .as_ref()
            .and_then(|m| first_mention(&m.text))
            .ok_or(PayloadError::MissingField("requester mention in message.text"))?;
        let (channel, ts) = actions.message_location()?;

        record_decision(
            platform,
            decision,
            &actions.user.id,
            requester_id,
            None,
            channel,
            ts,
        )
        .await?;
        Ok(())
    })
}

fn legacy_decision(action: &ActionPayload) -> Decision {
    match action.value.as_deref() {
        Some("approve") => Decision::Approved,
        Some("reject") => Decision::Rejected,
        _ if action.action_id.starts_with("approve") => Decision::Approved,
        _ => Decision::Rejected,
    }
}
