//! Interaction dispatch table.
//!
//! Maps modal callback ids and button action ids to the functions that handle
//! them. The table is built once at startup and only read afterwards.

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::slack::MessagingPlatform;

use super::messages::{APPROVE_ACTION, REJECT_ACTION};
use super::payload::{ActionPayload, BlockActions, ViewSubmission};
use super::views::APPROVAL_MODAL_CALLBACK;
use super::workflow::{
    handle_approval_submission, handle_approve, handle_legacy_decision, handle_reject,
    HandlerError, ViewResponse,
};

/// Action id of approve buttons on messages from the older layout.
pub const LEGACY_APPROVE_ACTION: &str = "approve_action";

/// Action id of reject buttons on messages from the older layout.
pub const LEGACY_REJECT_ACTION: &str = "reject_action";

/// Handles a modal submission.
pub type ViewHandler = for<'a> fn(
    &'a dyn MessagingPlatform,
    &'a ViewSubmission,
) -> BoxFuture<'a, Result<ViewResponse, HandlerError>>;

/// Handles one block action.
pub type ActionHandler = for<'a> fn(
    &'a dyn MessagingPlatform,
    &'a BlockActions,
    &'a ActionPayload,
) -> BoxFuture<'a, Result<(), HandlerError>>;

/// Lookup table from interaction identifiers to handlers.
#[derive(Default)]
pub struct Dispatcher {
    views: HashMap<&'static str, ViewHandler>,
    actions: HashMap<&'static str, ActionHandler>,
}

impl Dispatcher {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for the approval flow.
    pub fn approval() -> Self {
        Self::new()
            .with_view(APPROVAL_MODAL_CALLBACK, handle_approval_submission)
            .with_action(APPROVE_ACTION, handle_approve)
            .with_action(REJECT_ACTION, handle_reject)
            .with_action(LEGACY_APPROVE_ACTION, handle_legacy_decision)
            .with_action(LEGACY_REJECT_ACTION, handle_legacy_decision)
    }

    pub fn with_view(mut self, callback_id: &'static str, handler: ViewHandler) -> Self {
        self.views.insert(callback_id, handler);
        self
    }

    pub fn with_action(mut self, action_id: &'static str, handler: ActionHandler) -> Self {
        self.actions.insert(action_id, handler);
        self
    }

    pub fn view_handler(&self, callback_id: &str) -> Option<ViewHandler> {
        self.views.get(callback_id).copied()
    }

    pub fn action_handler(&self, action_id: &str) -> Option<ActionHandler> {
        self.actions.get(action_id).copied()
    }

    /// Registered modal callback ids, sorted.
    pub fn view_callbacks(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.views.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Registered action ids, sorted.
    pub fn action_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.actions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("views", &self.view_callbacks())
            .field("actions", &self.action_ids())
            .finish()
    }
}
