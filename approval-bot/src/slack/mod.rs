//! Slack messaging platform integration.
//!
//! This module provides:
//! - Block Kit types for modals and messages
//! - The [`MessagingPlatform`] trait the handlers call out through
//! - [`SlackClient`], the Web API implementation of that trait

pub mod client;
pub mod types;

pub use client::{MessagingPlatform, SlackClient, SlackError};
pub use types::{
    Block, ButtonStyle, Element, Message, MessageRef, ModalView, SelectOption, Text, User, View,
};
