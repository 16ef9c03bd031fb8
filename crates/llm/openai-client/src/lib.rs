//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for streamed chat completion.
//! Builds clients that never retry, and masks API keys in logs.

use async_openai::{config::OpenAIConfig, types::CreateChatCompletionRequestArgs, Client};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
pub use rmp_core::mask_token;

/// A chunk of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    /// Content delta carried by this chunk; `None` when the chunk has no text (role-only, usage).
    pub content: Option<String>,
}

/// Chunks in the order the API produced them.
pub type ChunkStream = Pin<Box<dyn Stream<Item = anyhow::Result<StreamChunk>> + Send>>;

/// Builds an async-openai client for `api_key`, optionally against `base_url`.
///
/// Retries are disabled: a failed request surfaces immediately to the caller.
pub fn build_client(api_key: &str, base_url: Option<&str>) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(url) = base_url.filter(|s| !s.is_empty()) {
        config = config.with_api_base(url);
    }
    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(config).with_backoff(no_retry)
}

/// OpenAI chat client. Wraps async-openai client; optionally holds API key for masked logging.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<OpenAIConfig>>,
    /// API key stored only for logging (masked). None when created via `with_client()`.
    api_key_for_logging: Option<String>,
}

impl OpenAIClient {
    /// Builds a client using the given API key and default API base URL.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Arc::new(build_client(&api_key, None)),
            api_key_for_logging: Some(api_key),
        }
    }

    /// Builds a client with a custom base URL (e.g. for proxies or compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Arc::new(build_client(&api_key, Some(&base_url))),
            api_key_for_logging: Some(api_key),
        }
    }

    /// Builds a client from an existing async-openai client (no API key stored for logging).
    pub fn with_client(client: Client<OpenAIConfig>) -> Self {
        Self {
            client: Arc::new(client),
            api_key_for_logging: None,
        }
    }

    fn masked_key(&self) -> String {
        self.api_key_for_logging
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "***".to_string())
    }

    /// Opens a streamed chat completion and returns its chunks.
    ///
    /// The HTTP request is made when the stream is first polled, so connection and API
    /// errors arrive as the first stream item. Dropping the stream closes the connection.
    pub async fn chat_completion_stream(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> anyhow::Result<ChunkStream> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            api_key = %self.masked_key(),
            "OpenAI chat_completion_stream request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .stream(true)
            .build()?;

        if let Ok(json) = serde_json::to_string(&request) {
            tracing::debug!(request_json = %json, "OpenAI chat_completion_stream request JSON");
        }

        let stream = self.client.chat().create_stream(request).await?;

        let chunks = stream.map(|result| {
            let chunk = result.map_err(|e| anyhow::anyhow!("Stream error: {}", e))?;
            if let Some(ref u) = chunk.usage {
                tracing::info!(
                    prompt_tokens = u.prompt_tokens,
                    completion_tokens = u.completion_tokens,
                    total_tokens = u.total_tokens,
                    "OpenAI chat_completion_stream usage"
                );
            }
            let choice = chunk.choices.first();
            if let Some(reason) = choice.and_then(|c| c.finish_reason.as_ref()) {
                tracing::debug!(finish_reason = ?reason, "OpenAI chat_completion_stream finished");
            }
            Ok(StreamChunk {
                content: choice.and_then(|c| c.delta.content.clone()),
            })
        });

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_key_hides_middle() {
        let client = OpenAIClient::new("sk-proj-abcdefghijklmnop".to_string());
        assert_eq!(client.masked_key(), "sk-proj***mnop");
    }

    #[test]
    fn masked_key_without_stored_key() {
        let client = OpenAIClient::with_client(build_client("sk-x", None));
        assert_eq!(client.masked_key(), "***");
    }
}
