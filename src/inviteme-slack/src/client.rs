//! [`DirectoryClient`] over the Slack Web API.

use std::collections::HashSet;

use async_trait::async_trait;
use inviteme_core::{
    Conversation, ConversationId, Cursor, DirectoryClient, DirectoryError, MemberId, MembersPage,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::{self, ConversationsListResponse, ConversationsMembersResponse};
use crate::config::SlackConfig;
use crate::error::{DEFAULT_RETRY_AFTER_SECS, SlackError, SlackResult};

/// Slack-backed conversation directory.
pub struct SlackDirectoryClient {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackDirectoryClient {
    /// Create a client for the given configuration.
    pub fn new(config: SlackConfig) -> SlackResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| SlackError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Every non-archived public and private channel visible to the token.
    pub async fn conversations(&self) -> SlackResult<Vec<Conversation>> {
        let mut conversations = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut sent: HashSet<Cursor> = HashSet::new();

        loop {
            let mut url = format!(
                "{}?types=public_channel,private_channel&exclude_archived=true&limit={}",
                self.config.method_url("conversations.list"),
                self.config.page_size()
            );
            if let Some(cursor) = &cursor {
                url.push_str("&cursor=");
                url.push_str(cursor.as_query_value());
            }

            let page: ConversationsListResponse =
                self.api_call("conversations.list", self.client.get(&url)).await?;
            conversations.extend(
                page.channels
                    .into_iter()
                    .filter(|channel| !channel.is_archived)
                    .map(|channel| Conversation::new(channel.id, channel.name)),
            );

            let next = api::next_cursor(&page.response_metadata)
                .as_deref()
                .and_then(Cursor::from_remote);
            let Some(next) = next else {
                break;
            };
            if !sent.insert(next.clone()) {
                return Err(SlackError::InvalidPayload(
                    "conversations.list returned a cursor it already sent".to_string(),
                ));
            }
            cursor = Some(next);
        }

        debug!("Listed {} conversations", conversations.len());
        Ok(conversations)
    }

    /// One page of `conversations.members`.
    pub async fn members_page(
        &self,
        conversation: &ConversationId,
        cursor: Option<&Cursor>,
    ) -> SlackResult<MembersPage> {
        let mut url = format!(
            "{}?channel={}&limit={}",
            self.config.method_url("conversations.members"),
            urlencoding::encode(conversation.as_str()),
            self.config.page_size()
        );
        if let Some(cursor) = cursor {
            url.push_str("&cursor=");
            url.push_str(cursor.as_query_value());
        }

        let page: ConversationsMembersResponse = self
            .api_call("conversations.members", self.client.get(&url))
            .await?;

        Ok(MembersPage {
            next_cursor: api::next_cursor(&page.response_metadata),
            members: page.members.into_iter().map(MemberId::from).collect(),
        })
    }

    /// Invite `members` into `conversation` with one `conversations.invite`.
    pub async fn invite(
        &self,
        conversation: &ConversationId,
        members: &[MemberId],
    ) -> SlackResult<()> {
        let users = members
            .iter()
            .map(MemberId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let payload = serde_json::json!({
            "channel": conversation.as_str(),
            "users": users,
        });

        let request = self
            .client
            .post(self.config.method_url("conversations.invite"))
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&payload);
        let _: serde_json::Value = self.api_call("conversations.invite", request).await?;
        Ok(())
    }

    /// Send a Web API request and decode its body.
    async fn api_call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> SlackResult<T> {
        let response = request
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token()),
            )
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!("{} rate limited, retry after {}s", method, retry_after);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{} {}: {}", method, status, body)));
        }

        let body: serde_json::Value = response.json().await?;
        api::check_ok(method, &body)?;

        if let Some(warning) = body.get("warning").and_then(|w| w.as_str()) {
            debug!("{} warning: {}", method, warning);
        }

        serde_json::from_value(body)
            .map_err(|e| SlackError::InvalidPayload(format!("{}: {}", method, e)))
    }
}

#[async_trait]
impl DirectoryClient for SlackDirectoryClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, DirectoryError> {
        Ok(self.conversations().await?)
    }

    async fn list_members(
        &self,
        conversation: &ConversationId,
        cursor: Option<&Cursor>,
    ) -> Result<MembersPage, DirectoryError> {
        Ok(self.members_page(conversation, cursor).await?)
    }

    async fn invite_members(
        &self,
        conversation: &ConversationId,
        members: &[MemberId],
    ) -> Result<(), DirectoryError> {
        Ok(self.invite(conversation, members).await?)
    }
}
