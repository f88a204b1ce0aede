use crate::entities::chat_completion_message::ChatCompletionMessage;
use serde::{Deserialize, Serialize};

/// Body accepted by `POST /chat` and sent by the streaming client.
///
/// `temperature` and `stream` are optional on the wire; the relay fills
/// missing values from the configured chat defaults. The relay reads
/// `messages` as raw JSON objects so that every field a caller sends is
/// forwarded upstream untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest<M = ChatCompletionMessage> {
    pub messages: Vec<M>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Caller body as the relay sees it.
pub type RelayedChatRequest = ChatRequest<serde_json::Map<String, serde_json::Value>>;

/// Body the relay posts to the upstream chat-completion API.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest<'a, M> {
    pub model: &'a str,
    pub messages: &'a [M],
    pub temperature: f32,
    pub stream: bool,
}
