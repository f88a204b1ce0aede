//! Streaming client for the relay's `POST /chat` endpoint.

pub mod chat_client;
pub mod sse;

pub use chat_client::{ChatClient, ChatReply, ClientError, ReplyHandler, SendOptions, DEFAULT_ENDPOINT};
pub use sse::{SseDecoder, SseFrame};
