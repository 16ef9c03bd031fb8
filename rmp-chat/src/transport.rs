//! HTTP transport to `POST /api/chat`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use rmp_core::{ChatMessage, ClientError};
use std::pin::Pin;
use tracing::{info, instrument, warn};

/// Raw reply bytes as they arrive; no framing.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// Sends a transcript and returns the streamed reply body.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        messages: &[ChatMessage],
        bearer_token: Option<&str>,
    ) -> Result<ByteStream, ClientError>;
}

/// reqwest-based transport against an rmp-server base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// `server_url` is the base URL, e.g. `http://127.0.0.1:3000`.
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/chat", server_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    #[instrument(skip(self, messages, bearer_token), fields(message_count = messages.len()))]
    async fn send(
        &self,
        messages: &[ChatMessage],
        bearer_token: Option<&str>,
    ) -> Result<ByteStream, ClientError> {
        info!(endpoint = %self.endpoint, "step: send chat request");

        let mut request = self.client.post(&self.endpoint).json(messages);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&error_text)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(error_text);
            warn!(%status, %message, "chat request rejected");
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| ClientError::Network(e.to_string()))
        })))
    }
}
