//! OpenAI implementation of [`LlmClient`]: wraps openai-client and forwards messages as given.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use rmp_core::ChatMessage;
use tracing::instrument;

use super::{chat_message_to_openai, LlmClient, LlmConfig, LlmStream, StreamChunk, DEFAULT_MODEL};

/// [`LlmClient`] backed by openai-client.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Builds a client from [`LlmConfig`] (key, optional base URL, model).
    pub fn from_config(config: &dyn LlmConfig) -> Self {
        let client = match config.base_url() {
            Some(url) => Self::with_base_url(config.api_key().to_string(), url.to_string()),
            None => Self::new(config.api_key().to_string()),
        };
        client.with_model(config.model().to_string())
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages), fields(model = %self.model, message_count = messages.len()))]
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<LlmStream> {
        let openai_messages = messages
            .iter()
            .map(chat_message_to_openai)
            .collect::<Result<Vec<_>>>()?;

        let stream = self
            .client
            .chat_completion_stream(&self.model, openai_messages)
            .await?;

        Ok(Box::pin(stream.map(|item| {
            item.map(|chunk| StreamChunk {
                content: chunk.content.unwrap_or_default(),
            })
        })))
    }
}
