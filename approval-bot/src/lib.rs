//! Approval Bot - Slack approval requests with signed-request verification.
//!
//! A requester runs `/approval-test`, picks an approver in a modal and
//! describes the request. The approver gets Approve / Reject buttons; the
//! click notifies the requester and updates the approver's message.
//!
//! ## Architecture
//!
//! ```text
//! Slack → verify_slack_request → handler → Dispatcher → workflow → MessagingPlatform → Slack
//! ```
//!
//! Every inbound request passes the [`Authenticator`] before any handler
//! runs.

pub mod approval;
pub mod config;
pub mod slack;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use approval::Dispatcher;
pub use config::Config;
pub use slack::{MessagingPlatform, SlackClient};
pub use web::{router, AppState, Authenticator, VerificationResult};
