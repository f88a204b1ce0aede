use crate::client::sse::{SseDecoder, SseFrame};
use crate::entities::{ChatCompletion, ChatCompletionMessage, ChatRequest};
use futures::StreamExt;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/chat";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Relay answered with status {0}")]
    Status(u16),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendOptions {
    pub temperature: f32,
    pub stream: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self { temperature: 0.6, stream: true }
    }
}

/// Final outcome of one request.
#[derive(Debug, Clone)]
pub enum ChatReply {
    /// Streamed reply: the raw decoded body and the concatenated fragments.
    Streamed { raw: String, text: String },
    /// Non-streaming completion body.
    Completed(ChatCompletion),
}

impl ChatReply {
    /// Assistant text carried by the reply.
    pub fn content(&self) -> Option<&str> {
        match self {
            ChatReply::Streamed { text, .. } => Some(text.as_str()),
            ChatReply::Completed(completion) => completion.content(),
        }
    }
}

/// Receives the push notifications of one request.
///
/// `on_chunk` is called once per text fragment in wire order; `on_complete`
/// is called exactly once, after every `on_chunk` of the request.
pub trait ReplyHandler {
    fn on_chunk(&mut self, fragment: &str);

    fn on_complete(&mut self, _reply: &ChatReply) {}
}

/// HTTP client for the relay's chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), endpoint)
    }

    pub fn with_http(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends the conversation and reports the reply through `handler`.
    ///
    /// Errors are logged and returned; nothing is retried.
    pub async fn send_message<H>(
        &self,
        history: &[ChatCompletionMessage],
        options: &SendOptions,
        handler: &mut H,
    ) -> Result<ChatReply, ClientError>
    where
        H: ReplyHandler + ?Sized,
    {
        let result = self.exchange(history, options, handler).await;
        if let Err(e) = &result {
            log::error!("Chat request to {} failed: {}", self.endpoint, e);
        }
        result
    }

    async fn exchange<H>(
        &self,
        history: &[ChatCompletionMessage],
        options: &SendOptions,
        handler: &mut H,
    ) -> Result<ChatReply, ClientError>
    where
        H: ReplyHandler + ?Sized,
    {
        let request = ChatRequest {
            messages: history.to_vec(),
            temperature: Some(options.temperature),
            stream: Some(options.stream),
        };

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let reply = if options.stream {
            let mut decoder = SseDecoder::new();
            let mut raw = Vec::new();
            let mut text = String::new();
            let mut body = Box::pin(response.bytes_stream());

            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                raw.extend_from_slice(&chunk);
                for frame in decoder.push(&chunk) {
                    dispatch(frame, &mut text, handler);
                }
            }
            if let Some(frame) = decoder.finish() {
                dispatch(frame, &mut text, handler);
            }

            ChatReply::Streamed { raw: String::from_utf8_lossy(&raw).into_owned(), text }
        } else {
            let body = response.bytes().await?;
            ChatReply::Completed(serde_json::from_slice(&body)?)
        };

        handler.on_complete(&reply);
        Ok(reply)
    }
}

fn dispatch<H>(frame: SseFrame, text: &mut String, handler: &mut H)
where
    H: ReplyHandler + ?Sized,
{
    if let SseFrame::Delta(fragment) = frame {
        text.push_str(&fragment);
        handler.on_chunk(&fragment);
    }
}
