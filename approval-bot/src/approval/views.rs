//! The approval request modal.

use tracing::warn;

use crate::slack::{Block, Element, ModalView, SelectOption, Text, User, View};

/// Callback id of the approval request modal.
pub const APPROVAL_MODAL_CALLBACK: &str = "approval_request_modal";

/// Block holding the approver select menu.
pub const APPROVER_BLOCK: &str = "approver_block";

/// Action id of the approver select menu.
pub const APPROVER_SELECT: &str = "approver_select";

/// Block holding the request text input.
pub const APPROVAL_TEXT_BLOCK: &str = "approval_text_block";

/// Action id of the request text input.
pub const APPROVAL_TEXT_INPUT: &str = "approval_text_input";

/// Longest request text the modal accepts, in characters.
///
/// The text is repeated in both button values, which Slack caps at 2000
/// characters each.
pub const MAX_APPROVAL_TEXT_LENGTH: usize = 900;

/// Slack rejects static selects with more options than this.
pub const MAX_SELECT_OPTIONS: usize = 100;

/// Build the modal that asks for an approver and the request text.
///
/// Bots and deleted accounts are left out of the approver list.
pub fn approval_modal(users: &[User]) -> View {
    let selectable: Vec<&User> = users.iter().filter(|u| u.is_selectable()).collect();

    if selectable.len() > MAX_SELECT_OPTIONS {
        warn!(
            users = selectable.len(),
            max_options = MAX_SELECT_OPTIONS,
            "approver_options_truncated"
        );
    }

    let options = selectable
        .into_iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|user| SelectOption {
            text: Text::plain(user.display_name.clone()),
            value: user.id.clone(),
        })
        .collect();

    View::Modal(ModalView {
        callback_id: APPROVAL_MODAL_CALLBACK.to_string(),
        title: Text::plain("Request Approval"),
        submit: Some(Text::plain("Submit")),
        close: Some(Text::plain("Cancel")),
        blocks: vec![
            Block::Input {
                block_id: APPROVER_BLOCK.to_string(),
                label: Text::plain("Select Approver"),
                element: Element::StaticSelect {
                    action_id: APPROVER_SELECT.to_string(),
                    placeholder: Text::plain("Select an approver"),
                    options,
                },
            },
            Block::Input {
                block_id: APPROVAL_TEXT_BLOCK.to_string(),
                label: Text::plain("Approval Request"),
                element: Element::PlainTextInput {
                    action_id: APPROVAL_TEXT_INPUT.to_string(),
                    multiline: true,
                    placeholder: Some(Text::plain("What do you need approval for?")),
                    max_length: Some(MAX_APPROVAL_TEXT_LENGTH),
                },
            },
        ],
    })
}
