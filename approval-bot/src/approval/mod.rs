//! Approval workflow module.
//!
//! ## Flow
//!
//! ```text
//! /approval-test → modal → view_submission → approver message (Approve / Reject)
//!                                          → requester confirmation
//! button click → requester notice → approver message updated
//! ```

pub mod dispatch;
pub mod messages;
pub mod payload;
pub mod views;
pub mod workflow;

pub use dispatch::{ActionHandler, Dispatcher, ViewHandler};
pub use messages::Decision;
pub use payload::{
    ApprovalRequest, BlockActions, ButtonValue, InteractionForm, InteractionPayload,
    PayloadError, SlashCommandForm, ValidationErrors, ViewSubmission, MAX_BUTTON_VALUE_LENGTH,
};
pub use views::MAX_APPROVAL_TEXT_LENGTH;
pub use workflow::{open_approval_modal, HandlerError, ViewResponse};
