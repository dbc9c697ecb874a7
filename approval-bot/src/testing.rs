//! In-memory messaging platform for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::slack::{Message, MessageRef, MessagingPlatform, SlackError, User, View};

/// A call made against the platform.
#[derive(Debug, Clone)]
pub enum Call {
    ListUsers,
    OpenForm { trigger_id: String, view: View },
    PostMessage { channel: String, message: Message },
    UpdateMessage { channel: String, ts: String, message: Message },
}

/// Records every call and answers from canned data.
#[derive(Default)]
pub struct RecordingPlatform {
    users: Vec<User>,
    fail: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingPlatform {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    /// Every call is recorded, then fails with an API error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call, method: &str) -> Result<(), SlackError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(SlackError::Api {
                method: method.to_string(),
                error: "fake_failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingPlatform for RecordingPlatform {
    async fn list_users(&self) -> Result<Vec<User>, SlackError> {
        self.record(Call::ListUsers, "users.list")?;
        Ok(self.users.clone())
    }

    async fn open_form(&self, trigger_id: &str, view: &View) -> Result<(), SlackError> {
        self.record(
            Call::OpenForm {
                trigger_id: trigger_id.to_string(),
                view: view.clone(),
            },
            "views.open",
        )
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &Message,
    ) -> Result<MessageRef, SlackError> {
        self.record(
            Call::PostMessage {
                channel: channel.to_string(),
                message: message.clone(),
            },
            "chat.postMessage",
        )?;
        Ok(MessageRef {
            channel: channel.to_string(),
            ts: "1700000000.000100".to_string(),
        })
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &Message,
    ) -> Result<(), SlackError> {
        self.record(
            Call::UpdateMessage {
                channel: channel.to_string(),
                ts: ts.to_string(),
                message: message.clone(),
            },
            "chat.update",
        )
    }
}

/// A human workspace member.
pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        display_name: name.to_string(),
        is_bot: false,
        is_deleted: false,
    }
}
