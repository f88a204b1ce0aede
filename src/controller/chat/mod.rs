pub mod chat;

pub use chat::{not_found, relay_chat};
