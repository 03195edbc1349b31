use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::{ChatBackend, ChatError};
use crate::creativity::Creativity;

pub const DEFAULT_CHAT_URL: &str = "https://intellichat-ai-chatbot.p.rapidapi.com/chat";
pub const DEFAULT_CHAT_HOST: &str = "intellichat-ai-chatbot.p.rapidapi.com";

/// Where and how to reach the hosted chat model.
#[derive(Clone)]
pub struct ChatEndpoint {
    pub url: String,
    pub host: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ChatEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEndpoint")
            .field("url", &self.url)
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ChatEndpoint {
    fn default() -> Self {
        Self {
            url: DEFAULT_CHAT_URL.to_string(),
            host: DEFAULT_CHAT_HOST.to_string(),
            api_key: None,
        }
    }
}

/// Form-encoded POST client for the IntelliChat endpoint
#[derive(Clone)]
pub struct IntelliChatClient {
    client: Client,
    endpoint: ChatEndpoint,
}

impl IntelliChatClient {
    pub fn new(endpoint: ChatEndpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS roots, timeouts)
    pub fn with_client(endpoint: ChatEndpoint, client: Client) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &ChatEndpoint {
        &self.endpoint
    }

    fn request(&self, message: &str, creativity: Creativity) -> RequestBuilder {
        let mut request = self
            .client
            .post(&self.endpoint.url)
            .header("x-rapidapi-host", &self.endpoint.host);

        if let Some(key) = &self.endpoint.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        // .form() also sets Content-Type: application/x-www-form-urlencoded
        request.form(&[("message", message), ("temperature", creativity.as_str())])
    }
}

#[async_trait]
impl ChatBackend for IntelliChatClient {
    async fn reply(&self, message: &str, creativity: Creativity) -> Result<String, ChatError> {
        debug!(url = %self.endpoint.url, temperature = creativity.as_str(), "Sending chat request");

        let response = self
            .request(message, creativity)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ChatError::Body(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ChatError::EmptyReply);
        }

        debug!(bytes = text.len(), "Chat reply received");
        Ok(text)
    }
}
