//! Conversation controller: owns the message history and drives the
//! rendered transcript while a reply streams in.

pub mod session;
pub mod transcript;

pub use session::{apology, system_prompt, Conversation, SendOrigin, SendOutcome};
pub use transcript::{ReplyId, Transcript};
