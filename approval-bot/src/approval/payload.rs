//! Inbound Slack payloads.
//!
//! Slash commands arrive as form fields. Interactions arrive as a single
//! form field, `payload`, holding a JSON document whose `type` decides its
//! shape.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::views::{
    APPROVAL_TEXT_BLOCK, APPROVAL_TEXT_INPUT, APPROVER_BLOCK, APPROVER_SELECT,
    MAX_APPROVAL_TEXT_LENGTH,
};

/// Slack's limit on a button value, in characters.
pub const MAX_BUTTON_VALUE_LENGTH: usize = 2000;

/// Errors decoding an interaction payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("interaction payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("{kind} payload has an unexpected shape: {source}")]
    InvalidShape {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("button value is not a valid approval reference: {0}")]
    InvalidButtonValue(#[source] serde_json::Error),

    #[error("block_actions payload is missing {0}")]
    MissingField(&'static str),
}

// =============================================================================
// Slash Commands
// =============================================================================

/// Slash command form payload.
///
/// Slack sends more fields than these; unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SlashCommandForm {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

/// Interaction form payload.
#[derive(Debug, Default, Deserialize)]
pub struct InteractionForm {
    #[serde(default)]
    pub payload: Option<String>,
}

// =============================================================================
// Interactions
// =============================================================================

/// A decoded interaction.
#[derive(Debug)]
pub enum InteractionPayload {
    ViewSubmission(ViewSubmission),
    BlockActions(BlockActions),
    UrlVerification { challenge: String },
    /// Any other interaction type, carrying the type name.
    Unsupported(String),
}

impl InteractionPayload {
    /// Decode the JSON carried in the `payload` form field.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(PayloadError::InvalidJson)?;

        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        let shape = |source: serde_json::Error| PayloadError::InvalidShape {
            kind: kind.clone(),
            source,
        };

        match kind.as_str() {
            "view_submission" => serde_json::from_value(value)
                .map(InteractionPayload::ViewSubmission)
                .map_err(shape),
            "block_actions" => serde_json::from_value(value)
                .map(InteractionPayload::BlockActions)
                .map_err(shape),
            "url_verification" => serde_json::from_value::<UrlVerification>(value)
                .map(|v| InteractionPayload::UrlVerification {
                    challenge: v.challenge,
                })
                .map_err(shape),
            _ => Ok(InteractionPayload::Unsupported(kind.clone())),
        }
    }

    /// The interaction type name, for logging.
    pub fn kind(&self) -> &str {
        match self {
            InteractionPayload::ViewSubmission(_) => "view_submission",
            InteractionPayload::BlockActions(_) => "block_actions",
            InteractionPayload::UrlVerification { .. } => "url_verification",
            InteractionPayload::Unsupported(kind) => kind,
        }
    }
}

#[derive(Deserialize)]
struct UrlVerification {
    #[serde(default)]
    challenge: String,
}

/// Reference to a user acting on an interaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub id: String,
}

/// A submitted modal.
#[derive(Debug, Deserialize)]
pub struct ViewSubmission {
    #[serde(default)]
    pub user: UserRef,
    pub view: SubmittedView,
}

/// The modal as it was when submitted.
#[derive(Debug, Deserialize)]
pub struct SubmittedView {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub state: ViewState,
}

/// Input values keyed by block id, then action id.
#[derive(Debug, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, InputValue>>,
}

impl ViewState {
    /// Look up the value of one input element.
    pub fn input(&self, block_id: &str, action_id: &str) -> Option<&InputValue> {
        self.values.get(block_id)?.get(action_id)
    }
}

/// State of one input element. Which field is set depends on the element type.
#[derive(Debug, Default, Deserialize)]
pub struct InputValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
    #[serde(default)]
    pub selected_user: Option<String>,
}

impl InputValue {
    /// The non-blank value entered or selected, if any.
    pub fn entered(&self) -> Option<&str> {
        self.selected_option
            .as_ref()
            .map(|o| o.value.as_str())
            .or(self.selected_user.as_deref())
            .or(self.value.as_deref())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectedOption {
    #[serde(default)]
    pub value: String,
}

/// A button click (or other block element action).
#[derive(Debug, Deserialize)]
pub struct BlockActions {
    #[serde(default)]
    pub user: UserRef,
    #[serde(default)]
    pub actions: Vec<ActionPayload>,
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    #[serde(default)]
    pub message: Option<MessageInfo>,
}

impl BlockActions {
    /// Channel and timestamp of the message the action was taken on.
    pub fn message_location(&self) -> Result<(&str, &str), PayloadError> {
        let channel = self
            .channel
            .as_ref()
            .map(|c| c.id.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(PayloadError::MissingField("channel.id"))?;
        let ts = self
            .message
            .as_ref()
            .map(|m| m.ts.as_str())
            .filter(|ts| !ts.is_empty())
            .ok_or(PayloadError::MissingField("message.ts"))?;
        Ok((channel, ts))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelRef {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageInfo {
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub text: String,
}

// =============================================================================
// Approval Data
// =============================================================================

/// Reference carried in the approve/reject button value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonValue {
    #[serde(rename = "requesterId")]
    pub requester_id: String,
    #[serde(rename = "approvalText")]
    pub approval_text: String,
}

impl ButtonValue {
    /// Whether the encoded value fits in a button.
    pub fn fits(&self) -> bool {
        self.encode().chars().count() <= MAX_BUTTON_VALUE_LENGTH
    }

    pub fn encode(&self) -> String {
        // Two string fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(raw).map_err(PayloadError::InvalidButtonValue)
    }
}

/// A validated approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub requester_id: String,
    pub approver_id: String,
    pub text: String,
}

/// Form errors keyed by block id, in the shape Slack renders under inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn add(&mut self, block_id: &str, reason: &str) {
        self.0.insert(block_id.to_string(), reason.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, block_id: &str) -> Option<&str> {
        self.0.get(block_id).map(String::as_str)
    }
}

impl ViewSubmission {
    /// Extract an approval request from the canonical modal, checking that
    /// every required input is present and non-blank and that the text fits
    /// in the approver's message.
    pub fn approval_request(&self) -> Result<ApprovalRequest, ValidationErrors> {
        let state = &self.view.state;
        let approver = state
            .input(APPROVER_BLOCK, APPROVER_SELECT)
            .and_then(InputValue::entered);
        let text = state
            .input(APPROVAL_TEXT_BLOCK, APPROVAL_TEXT_INPUT)
            .and_then(InputValue::entered);

        let mut errors = ValidationErrors::default();
        if approver.is_none() {
            errors.add(APPROVER_BLOCK, "Please select an approver");
        }
        match text {
            None => errors.add(APPROVAL_TEXT_BLOCK, "Please enter request details"),
            Some(text) if !self.text_fits(text) => errors.add(
                APPROVAL_TEXT_BLOCK,
                &format!(
                    "Request details must be at most {} characters",
                    MAX_APPROVAL_TEXT_LENGTH
                ),
            ),
            Some(_) => {}
        }

        match (approver, text) {
            (Some(approver), Some(text)) if errors.is_empty() => Ok(ApprovalRequest {
                requester_id: self.user.id.clone(),
                approver_id: approver.to_string(),
                text: text.to_string(),
            }),
            _ => Err(errors),
        }
    }

    fn text_fits(&self, text: &str) -> bool {
        text.chars().count() <= MAX_APPROVAL_TEXT_LENGTH
            && ButtonValue {
                requester_id: self.user.id.clone(),
                approval_text: text.to_string(),
            }
            .fits()
    }
}

/// Extract the first `<@USER>` mention from message text.
///
/// Mentions may carry a label, as in `<@U123|ada>`.
pub fn first_mention(text: &str) -> Option<&str> {
    let start = text.find("<@")? + 2;
    let rest = &text[start..];
    let end = rest.find('>')?;
    let mention = &rest[..end];
    let id = mention.split('|').next().unwrap_or(mention);
    (!id.is_empty()).then_some(id)
}
