//! Slack Web API client.
//!
//! Every call is a POST (or GET for reads) to `{base_url}/{method}` with the
//! bot token as a bearer credential. Slack answers HTTP 200 with an
//! `{"ok": false, "error": "..."}` envelope for most failures, so the envelope
//! is checked on every response.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::types::{Message, MessageRef, User, View};

/// Page size requested from `users.list`.
const USERS_PAGE_LIMIT: u32 = 200;

/// Upper bound on pages followed, in case a cursor never terminates.
const USERS_MAX_PAGES: usize = 50;

/// Errors that can occur when talking to Slack.
#[derive(Debug, Error)]
pub enum SlackError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with `ok: false`.
    #[error("Slack API error in {method}: {error}")]
    Api { method: String, error: String },

    /// Rate limited by Slack.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Bot token cannot be sent as a header.
    #[error("Invalid bot token format")]
    InvalidToken,
}

/// Outbound operations the bot needs from the messaging platform.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    /// List all workspace members.
    async fn list_users(&self) -> Result<Vec<User>, SlackError>;

    /// Open a modal in response to a trigger.
    async fn open_form(&self, trigger_id: &str, view: &View) -> Result<(), SlackError>;

    /// Post a message to a channel or user.
    async fn post_message(&self, channel: &str, message: &Message)
        -> Result<MessageRef, SlackError>;

    /// Replace the content of a previously posted message.
    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &Message,
    ) -> Result<(), SlackError>;
}

/// Slack Web API client.
#[derive(Clone)]
pub struct SlackClient {
    inner: Arc<SlackClientInner>,
}

struct SlackClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl SlackClient {
    /// Create a new client authenticated with `bot_token`.
    pub fn new(
        bot_token: &SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SlackError> {
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", bot_token.expose_secret()))
                .map_err(|_| SlackError::InvalidToken)?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SlackClientInner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.inner.base_url, method)
    }

    /// Call a write method with a JSON body.
    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, SlackError> {
        let response = self
            .inner
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await?;
        handle_response(method, response).await
    }

    /// Call a read method with query parameters.
    async fn get<Q: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        query: &Q,
    ) -> Result<T, SlackError> {
        let response = self
            .inner
            .client
            .get(self.url(method))
            .query(query)
            .send()
            .await?;
        handle_response(method, response).await
    }
}

/// Check HTTP status and the `ok` envelope, then decode the payload.
async fn handle_response<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<T, SlackError> {
    let status = response.status();

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(SlackError::RateLimited(retry_after));
    }

    if !status.is_success() {
        return Err(SlackError::Api {
            method: method.to_string(),
            error: format!("http_status_{}", status.as_u16()),
        });
    }

    let value: serde_json::Value = response
        .json()
        .await
        .map_err(|e| SlackError::Parse(format!("Failed to parse response: {e}")))?;

    decode_envelope(method, value)
}

fn decode_envelope<T: DeserializeOwned>(
    method: &str,
    value: serde_json::Value,
) -> Result<T, SlackError> {
    if !value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
        let error = value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown_error")
            .to_string();
        return Err(SlackError::Api {
            method: method.to_string(),
            error,
        });
    }

    serde_json::from_value(value)
        .map_err(|e| SlackError::Parse(format!("Unexpected {method} response: {e}")))
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct UsersListQuery<'a> {
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Deserialize)]
struct UsersListResponse {
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Member {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    is_bot: bool,
    #[serde(default)]
    deleted: bool,
}

impl From<Member> for User {
    fn from(member: Member) -> Self {
        let display_name = member
            .real_name
            .filter(|n| !n.trim().is_empty())
            .or(member.name.filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| "Unknown User".to_string());

        User {
            id: member.id,
            display_name,
            is_bot: member.is_bot,
            is_deleted: member.deleted,
        }
    }
}

#[derive(Serialize)]
struct OpenViewRequest<'a> {
    trigger_id: &'a str,
    view: &'a View,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    #[serde(flatten)]
    message: &'a Message,
}

#[derive(Serialize)]
struct UpdateMessageRequest<'a> {
    channel: &'a str,
    ts: &'a str,
    #[serde(flatten)]
    message: &'a Message,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    ts: String,
}

#[derive(Deserialize)]
struct Ack {}

/// Follow `next_cursor` until it comes back empty, or `USERS_MAX_PAGES` pages
/// have been read.
async fn collect_user_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<User>, SlackError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<UsersListResponse, SlackError>>,
{
    let mut users = Vec::new();
    let mut cursor: Option<String> = None;

    for _ in 0..USERS_MAX_PAGES {
        let page = fetch_page(cursor.take()).await?;

        users.extend(page.members.into_iter().map(User::from));

        cursor = page
            .response_metadata
            .and_then(|m| m.next_cursor)
            .filter(|c| !c.is_empty());
        if cursor.is_none() {
            break;
        }
    }

    if cursor.is_some() {
        warn!(
            users = users.len(),
            max_pages = USERS_MAX_PAGES,
            "slack_users_list_truncated"
        );
    }

    info!(users = users.len(), "slack_users_listed");
    Ok(users)
}

#[async_trait]
impl MessagingPlatform for SlackClient {
    async fn list_users(&self) -> Result<Vec<User>, SlackError> {
        collect_user_pages(move |cursor| async move {
            self.get::<_, UsersListResponse>(
                "users.list",
                &UsersListQuery {
                    limit: USERS_PAGE_LIMIT,
                    cursor: cursor.as_deref(),
                },
            )
            .await
        })
        .await
    }

    async fn open_form(&self, trigger_id: &str, view: &View) -> Result<(), SlackError> {
        let _: Ack = self
            .post("views.open", &OpenViewRequest { trigger_id, view })
            .await?;
        info!("slack_view_opened");
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &Message,
    ) -> Result<MessageRef, SlackError> {
        let response: PostMessageResponse = self
            .post("chat.postMessage", &PostMessageRequest { channel, message })
            .await?;
        info!(channel = %response.channel, ts = %response.ts, "slack_message_posted");
        Ok(MessageRef {
            channel: response.channel,
            ts: response.ts,
        })
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &Message,
    ) -> Result<(), SlackError> {
        let _: Ack = self
            .post(
                "chat.update",
                &UpdateMessageRequest {
                    channel,
                    ts,
                    message,
                },
            )
            .await?;
        info!(channel = %channel, ts = %ts, "slack_message_updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::slack::types::Block;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let token = SecretString::from("xoxb-test".to_string());
        let client =
            SlackClient::new(&token, "https://slack.com/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url("chat.postMessage"),
            "https://slack.com/api/chat.postMessage"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let token = SecretString::from("xoxb\nbroken".to_string());
        let result = SlackClient::new(&token, "https://slack.com/api", Duration::from_secs(1));
        assert!(matches!(result, Err(SlackError::InvalidToken)));
    }

    #[test]
    fn test_envelope_error() {
        let result: Result<Ack, _> =
            decode_envelope("views.open", json!({"ok": false, "error": "expired_trigger_id"}));
        match result {
            Err(SlackError::Api { method, error }) => {
                assert_eq!(method, "views.open");
                assert_eq!(error, "expired_trigger_id");
            }
            _ => panic!("Expected Api error"),
        }
    }

    #[test]
    fn test_envelope_missing_ok_is_error() {
        let result: Result<Ack, _> = decode_envelope("chat.update", json!({}));
        assert!(matches!(result, Err(SlackError::Api { .. })));
    }

    #[test]
    fn test_users_list_decoding() {
        let page: UsersListResponse = decode_envelope(
            "users.list",
            json!({
                "ok": true,
                "members": [
                    {
                        "id": "U1",
                        "name": "ada",
                        "real_name": "Ada Lovelace",
                        "is_bot": false,
                        "deleted": false
                    },
                    {"id": "U2", "name": "helper", "is_bot": true},
                    {"id": "U3", "deleted": true},
                    {"id": "U4", "name": "grace", "real_name": ""}
                ],
                "response_metadata": {"next_cursor": ""}
            }),
        )
        .unwrap();

        let users: Vec<User> = page.members.into_iter().map(User::from).collect();
        assert_eq!(users[0].display_name, "Ada Lovelace");
        assert!(users[1].is_bot);
        assert_eq!(users[2].display_name, "Unknown User");
        assert!(users[2].is_deleted);
        assert_eq!(users[3].display_name, "grace");
    }

    #[test]
    fn test_post_message_request_flattens_message() {
        let message = Message {
            text: "fallback".to_string(),
            blocks: vec![Block::section("hi")],
        };
        let body = serde_json::to_value(PostMessageRequest {
            channel: "U1",
            message: &message,
        })
        .unwrap();

        assert_eq!(body["channel"], "U1");
        assert_eq!(body["text"], "fallback");
        assert_eq!(body["blocks"][0]["type"], "section");
    }

    fn page(ids: &[&str], next_cursor: &str) -> UsersListResponse {
        UsersListResponse {
            members: ids
                .iter()
                .map(|id| Member {
                    id: id.to_string(),
                    name: Some(id.to_lowercase()),
                    real_name: None,
                    is_bot: false,
                    deleted: false,
                })
                .collect(),
            response_metadata: Some(ResponseMetadata {
                next_cursor: Some(next_cursor.to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_user_pages_follow_cursor_until_empty() {
        let mut pages = VecDeque::from([
            page(&["U1", "U2"], "c1"),
            page(&["U3"], "c2"),
            page(&["U4"], ""),
        ]);
        let mut requested = Vec::new();

        let users = collect_user_pages(|cursor| {
            requested.push(cursor);
            let next = pages.pop_front();
            async move { next.ok_or_else(|| SlackError::Parse("no more pages".to_string())) }
        })
        .await
        .unwrap();

        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2", "U3", "U4"]);
        assert_eq!(
            requested,
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_user_pages_stop_without_metadata() {
        let mut calls = 0;
        let users = collect_user_pages(|_| {
            calls += 1;
            async {
                Ok::<_, SlackError>(UsersListResponse {
                    members: Vec::new(),
                    response_metadata: None,
                })
            }
        })
        .await
        .unwrap();

        assert!(users.is_empty());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_user_pages_capped() {
        let mut calls = 0;
        let users = collect_user_pages(|_| {
            calls += 1;
            async { Ok::<_, SlackError>(page(&["U1"], "again")) }
        })
        .await
        .unwrap();

        assert_eq!(calls, USERS_MAX_PAGES);
        assert_eq!(users.len(), USERS_MAX_PAGES);
    }

    #[tokio::test]
    async fn test_user_pages_error_propagates() {
        let mut pages = VecDeque::from([page(&["U1"], "c1")]);
        let result = collect_user_pages(|_| {
            let next = pages.pop_front();
            async move {
                next.ok_or_else(|| SlackError::Api {
                    method: "users.list".to_string(),
                    error: "ratelimited".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(SlackError::Api { .. })));
    }
}
