//! Message layouts for each step of an approval.

use crate::slack::{Block, ButtonStyle, Element, Message, Text};

use super::payload::{ApprovalRequest, ButtonValue};

/// Block id of the approve/reject buttons.
pub const APPROVAL_ACTIONS_BLOCK: &str = "approval_actions";

/// Action id of the approve button.
pub const APPROVE_ACTION: &str = "approve_request";

/// Action id of the reject button.
pub const REJECT_ACTION: &str = "reject_request";

/// An approver's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
        }
    }

    fn emoji(self) -> &'static str {
        match self {
            Decision::Approved => ":white_check_mark:",
            Decision::Rejected => ":x:",
        }
    }
}

fn request_block(text: &str) -> Block {
    Block::section(format!("*Request:*\n{}", text))
}

fn decision_button(action_id: &str, label: &str, style: ButtonStyle, value: &str) -> Element {
    Element::Button {
        action_id: action_id.to_string(),
        text: Text::plain(label),
        value: value.to_string(),
        style: Some(style),
    }
}

/// Message sent to the approver, with approve and reject buttons.
pub fn approver_request(request: &ApprovalRequest) -> Message {
    let intro = format!(
        "You have a new approval request from <@{}>:",
        request.requester_id
    );
    let value = ButtonValue {
        requester_id: request.requester_id.clone(),
        approval_text: request.text.clone(),
    }
    .encode();

    Message {
        text: intro.clone(),
        blocks: vec![
            Block::section(intro),
            request_block(&request.text),
            Block::Actions {
                block_id: Some(APPROVAL_ACTIONS_BLOCK.to_string()),
                elements: vec![
                    decision_button(APPROVE_ACTION, "Approve", ButtonStyle::Primary, &value),
                    decision_button(REJECT_ACTION, "Reject", ButtonStyle::Danger, &value),
                ],
            },
        ],
    }
}

/// Confirmation sent to the requester once the approver has been notified.
pub fn requester_confirmation(request: &ApprovalRequest) -> Message {
    Message {
        text: format!(
            "Your approval request has been sent to <@{}>",
            request.approver_id
        ),
        blocks: vec![
            Block::section(format!(
                "Your approval request has been sent to <@{}>:",
                request.approver_id
            )),
            request_block(&request.text),
            Block::context("Awaiting response..."),
        ],
    }
}

/// Notice sent to the requester once the approver has decided.
///
/// `text` is `None` for requests from older messages that did not carry it.
pub fn decision_notice(decision: Decision, approver_id: &str, text: Option<&str>) -> Message {
    let mut blocks = vec![Block::section(format!(
        "{} Your approval request has been *{}* by <@{}>:",
        decision.emoji(),
        decision.as_str(),
        approver_id
    ))];
    if let Some(text) = text {
        blocks.push(request_block(text));
    }

    Message {
        text: format!(
            "Your approval request has been {} by <@{}>",
            decision.as_str(),
            approver_id
        ),
        blocks,
    }
}

/// Replacement for the approver's message once the buttons have been used.
pub fn decided_request(decision: Decision, requester_id: &str, text: Option<&str>) -> Message {
    let mut blocks = vec![Block::section(format!(
        "Approval request from <@{}>:",
        requester_id
    ))];
    if let Some(text) = text {
        blocks.push(request_block(text));
    }
    blocks.push(Block::context(format!(
        "{} You *{}* this request.",
        decision.emoji(),
        decision.as_str()
    )));

    Message {
        text: format!(
            "Approval request from <@{}> ({})",
            requester_id,
            decision.title()
        ),
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            requester_id: "U456".to_string(),
            approver_id: "U123".to_string(),
            text: "Test approval request".to_string(),
        }
    }

    #[test]
    fn test_approver_request_buttons() {
        let value = serde_json::to_value(approver_request(&request())).unwrap();
        let actions = &value["blocks"][2];

        assert_eq!(actions["type"], "actions");
        assert_eq!(actions["block_id"], APPROVAL_ACTIONS_BLOCK);
        assert_eq!(actions["elements"][0]["action_id"], APPROVE_ACTION);
        assert_eq!(actions["elements"][0]["style"], "primary");
        assert_eq!(actions["elements"][1]["action_id"], REJECT_ACTION);
        assert_eq!(actions["elements"][1]["style"], "danger");

        let carried =
            ButtonValue::decode(actions["elements"][0]["value"].as_str().unwrap()).unwrap();
        assert_eq!(carried.requester_id, "U456");
        assert_eq!(carried.approval_text, "Test approval request");
    }

    #[test]
    fn test_requester_confirmation() {
        let message = requester_confirmation(&request());
        assert_eq!(message.text, "Your approval request has been sent to <@U123>");
        assert_eq!(message.blocks.len(), 3);
        assert_eq!(message.blocks[2], Block::context("Awaiting response..."));
    }

    #[test]
    fn test_decision_notice() {
        let message = decision_notice(Decision::Rejected, "U123", Some("Test request"));
        assert_eq!(message.text, "Your approval request has been rejected by <@U123>");
        let Block::Section { text, .. } = &message.blocks[0] else {
            panic!("Expected section");
        };
        assert!(text.text().starts_with(":x:"));
        assert!(text.text().contains("*rejected*"));
        assert_eq!(message.blocks.len(), 2);

        let legacy = decision_notice(Decision::Approved, "U123", None);
        assert_eq!(legacy.blocks.len(), 1);
    }

    #[test]
    fn test_decided_request() {
        let message = decided_request(Decision::Approved, "U456", Some("Test request"));
        assert_eq!(message.text, "Approval request from <@U456> (Approved)");
        assert_eq!(
            message.blocks.last(),
            Some(&Block::context(":white_check_mark: You *approved* this request."))
        );
    }
}
