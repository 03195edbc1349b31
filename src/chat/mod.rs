//! Outbound chat round-trips.
//!
//! The session only ever talks to a [`ChatBackend`]; the concrete HTTP client
//! lives in [`intellichat`].

pub mod intellichat;

use async_trait::async_trait;

use crate::creativity::Creativity;

pub use intellichat::{ChatEndpoint, IntelliChatClient};

/// Assistant text used whenever a round-trip fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user message and return the assistant's reply text.
    async fn reply(&self, message: &str, creativity: Creativity) -> Result<String, ChatError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Chat endpoint returned status {0}")]
    Status(u16),
    #[error("Could not decode reply body: {0}")]
    Body(String),
    #[error("Chat endpoint returned an empty reply")]
    EmptyReply,
}
