//! Response payloads of the Slack Web API methods the client uses.

use serde::Deserialize;

/// `response_metadata` block shared by paginated methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    /// Empty on the last page.
    #[serde(default)]
    pub next_cursor: String,
}

/// A channel entry in `conversations.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// `conversations.list` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsListResponse {
    pub channels: Vec<ChannelInfo>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// `conversations.members` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsMembersResponse {
    pub members: Vec<String>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// Raw `next_cursor` of a response, if any.
pub(crate) fn next_cursor(metadata: &Option<ResponseMetadata>) -> Option<String> {
    metadata
        .as_ref()
        .map(|m| m.next_cursor.clone())
        .filter(|cursor| !cursor.is_empty())
}

/// Fail with the mapped Slack error when the body says `"ok": false`.
pub(crate) fn check_ok(method: &str, body: &serde_json::Value) -> Result<(), crate::SlackApiError> {
    if body.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        return Ok(());
    }
    let error = body
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown");
    Err(crate::SlackApiError::new(error, format!("{} failed: {}", method, error)))
}
