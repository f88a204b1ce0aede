pub mod chat_completion_message;
pub mod chat_request;
pub mod completion;

pub use chat_completion_message::{ChatCompletionMessage, Role};
pub use chat_request::{ChatRequest, RelayedChatRequest, UpstreamRequest};
pub use completion::{
    ChatCompletion, ChunkChoice, CompletionChoice, CompletionChunk, CompletionDelta, CompletionMessage,
};
