//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait and an OpenAI implementation. The caller supplies the
//! complete message list (system instruction included); the client only streams the reply.
//!
//! [`LlmClient::stream_chat`] returns a boxed stream so that the trait stays dyn compatible.

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use rmp_core::{ChatMessage, MessageRole};
use std::pin::Pin;

mod config;
mod openai_llm;

pub use config::{EnvLlmConfig, LlmConfig, DEFAULT_MODEL};
pub use openai_llm::OpenAILlmClient;

/// A chunk of streamed LLM output; aligned with `openai_client::StreamChunk`.
///
/// `content` is empty when the provider sent a chunk without text.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub content: String,
}

/// Reply chunks in arrival order. Dropping the stream releases the upstream connection.
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// LLM client interface: streamed completion from a list of messages.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Starts a streamed completion for `messages`, sent as given.
    ///
    /// Errors that happen after the stream is returned (including a rejected request, for
    /// lazily connecting providers) arrive as `Err` items.
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<LlmStream>;
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}
