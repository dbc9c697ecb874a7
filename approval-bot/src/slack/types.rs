//! Block Kit and Web API types.
//!
//! Only the subset of Block Kit the approval flow renders is modelled here.
//! Reference: https://api.slack.com/reference/block-kit

use serde::{Deserialize, Serialize};

// =============================================================================
// Composition Objects
// =============================================================================

/// Text object, either plain text or Slack markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
    Mrkdwn {
        text: String,
    },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: None,
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    /// The raw text regardless of formatting type.
    pub fn text(&self) -> &str {
        match self {
            Text::PlainText { text, .. } | Text::Mrkdwn { text } => text,
        }
    }
}

/// Option entry of a select menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: Text,
    pub value: String,
}

/// Visual style of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

// =============================================================================
// Elements and Blocks
// =============================================================================

/// Interactive element placed inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button {
        action_id: String,
        text: Text,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
    StaticSelect {
        action_id: String,
        placeholder: Text,
        options: Vec<SelectOption>,
    },
    PlainTextInput {
        action_id: String,
        #[serde(default)]
        multiline: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<Text>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
}

/// Layout block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        text: Text,
    },
    Actions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        elements: Vec<Element>,
    },
    Context {
        elements: Vec<Text>,
    },
    Input {
        block_id: String,
        label: Text,
        element: Element,
    },
}

impl Block {
    /// Section block with markdown text and no block id.
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            block_id: None,
            text: Text::mrkdwn(text),
        }
    }

    /// Context block with a single markdown element.
    pub fn context(text: impl Into<String>) -> Self {
        Block::Context {
            elements: vec![Text::mrkdwn(text)],
        }
    }
}

// =============================================================================
// Surfaces
// =============================================================================

/// A view surface opened with `views.open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum View {
    Modal(ModalView),
}

/// Modal definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalView {
    pub callback_id: String,
    pub title: Text,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<Text>,
    pub blocks: Vec<Block>,
}

/// Message content for `chat.postMessage` and `chat.update`.
///
/// `text` is the notification fallback shown where blocks cannot render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl Message {
    /// Plain message without blocks.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }
}

// =============================================================================
// Web API Results
// =============================================================================

/// Workspace member as returned by `users.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub is_bot: bool,
    pub is_deleted: bool,
}

impl User {
    /// Whether the user can be picked as an approver.
    pub fn is_selectable(&self) -> bool {
        !self.is_bot && !self.is_deleted && !self.id.is_empty()
    }
}

/// Location of a posted message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_serialization() {
        assert_eq!(
            serde_json::to_value(Text::plain("Submit")).unwrap(),
            json!({"type": "plain_text", "text": "Submit"})
        );
        assert_eq!(
            serde_json::to_value(Text::mrkdwn("*Request:*")).unwrap(),
            json!({"type": "mrkdwn", "text": "*Request:*"})
        );
    }

    #[test]
    fn test_button_serialization() {
        let button = Element::Button {
            action_id: "approve_request".to_string(),
            text: Text::plain("Approve"),
            value: "{}".to_string(),
            style: Some(ButtonStyle::Primary),
        };

        assert_eq!(
            serde_json::to_value(button).unwrap(),
            json!({
                "type": "button",
                "action_id": "approve_request",
                "text": {"type": "plain_text", "text": "Approve"},
                "value": "{}",
                "style": "primary"
            })
        );
    }

    #[test]
    fn test_modal_serialization() {
        let view = View::Modal(ModalView {
            callback_id: "cb".to_string(),
            title: Text::plain("Title"),
            submit: None,
            close: None,
            blocks: vec![Block::section("hello")],
        });

        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["type"], "modal");
        assert_eq!(value["callback_id"], "cb");
        assert_eq!(value["blocks"][0]["type"], "section");
        assert!(value.get("submit").is_none());
    }

    #[test]
    fn test_user_selectable() {
        let user = User {
            id: "U1".to_string(),
            display_name: "Ada".to_string(),
            is_bot: false,
            is_deleted: false,
        };
        assert!(user.is_selectable());
        assert!(!User { is_bot: true, ..user.clone() }.is_selectable());
        assert!(!User { is_deleted: true, ..user }.is_selectable());
    }
}
