//! Retrieval-augmented completion: embed the question, query the index, augment the last
//! user turn, and stream the model's reply.

use bytes::Bytes;
use embedding::EmbeddingService;
use futures::{Stream, StreamExt};
use llm_client::{LlmClient, LlmStream, StreamChunk};
use prompt::{build_augmented_messages, format_retrieval_block, split_transcript};
use rmp_core::{ChatMessage, RagError};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tracing::{info, instrument, warn, Span};
use vector_index::{QueryRequest, VectorIndex, DEFAULT_TOP_K};

/// The request path from transcript to reply stream. Holds no per-request state.
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LlmClient>,
    system_prompt: Arc<str>,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmClient>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    /// Runs retrieval and opens the reply stream for `transcript`.
    ///
    /// Fails before any service call when the transcript is empty, does not end with a user
    /// message, or the last message is too large. Embedding and index failures fail the
    /// request; so does a completion that errors before producing its first chunk.
    #[instrument(skip_all, fields(message_count = transcript.len()))]
    pub async fn answer(&self, transcript: &[ChatMessage]) -> Result<ReplyStream, RagError> {
        let (history, question) = split_transcript(transcript)?;

        info!(text_len = question.content.len(), "step: embed question");
        let vector = self
            .embedder
            .embed(&question.content)
            .await
            .map_err(RagError::Embedding)?;

        info!(dimension = vector.len(), top_k = DEFAULT_TOP_K, "step: query vector index");
        let matches = self
            .index
            .query(QueryRequest::with_metadata(vector, DEFAULT_TOP_K))
            .await
            .map_err(RagError::Retrieval)?;

        let retrieval_block = format_retrieval_block(&matches);
        let messages =
            build_augmented_messages(&self.system_prompt, history, question, &retrieval_block);
        info!(
            match_count = matches.len(),
            completion_messages = messages.len(),
            "step: start completion"
        );

        let mut upstream = self
            .llm
            .stream_chat(messages)
            .await
            .map_err(RagError::Completion)?;

        let first = match upstream.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => return Err(RagError::Completion(e)),
            None => None,
        };

        Ok(ReplyStream::new(first, upstream))
    }
}

/// Lifecycle of a [`ReplyStream`]. Moves forward only; never returns to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyState {
    Open,
    Streaming,
    Errored,
    Closed,
}

/// Reply bytes for the HTTP body: each non-empty content delta, as UTF-8, in arrival order.
///
/// A completion error yields one `Err` item and then ends the stream. Dropping the stream at
/// any point drops the upstream completion stream with it.
pub struct ReplyStream {
    pending: Option<StreamChunk>,
    upstream: Option<LlmStream>,
    state: ReplyState,
    bytes_sent: usize,
    span: Span,
}

impl ReplyStream {
    fn new(first: Option<StreamChunk>, upstream: LlmStream) -> Self {
        Self {
            pending: first,
            upstream: Some(upstream),
            state: ReplyState::Open,
            bytes_sent: 0,
            span: Span::current(),
        }
    }

    pub fn state(&self) -> ReplyState {
        self.state
    }

    fn close(&mut self) {
        self.upstream = None;
        if self.state != ReplyState::Closed {
            self.state = ReplyState::Closed;
            info!(bytes_sent = self.bytes_sent, "step: reply stream closed");
        }
    }
}

impl Stream for ReplyStream {
    type Item = Result<Bytes, RagError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let span = this.span.clone();
        let _entered = span.enter();

        loop {
            match this.state {
                ReplyState::Closed => return Poll::Ready(None),
                ReplyState::Errored => {
                    this.close();
                    return Poll::Ready(None);
                }
                ReplyState::Open | ReplyState::Streaming => {}
            }

            let next = match this.pending.take() {
                Some(chunk) => Some(Ok(chunk)),
                None => match this.upstream.as_mut() {
                    Some(upstream) => ready!(upstream.as_mut().poll_next(cx)),
                    None => None,
                },
            };

            match next {
                Some(Ok(chunk)) => {
                    this.state = ReplyState::Streaming;
                    if chunk.content.is_empty() {
                        continue;
                    }
                    this.bytes_sent += chunk.content.len();
                    return Poll::Ready(Some(Ok(Bytes::from(chunk.content))));
                }
                Some(Err(e)) => {
                    warn!(error = %e, bytes_sent = this.bytes_sent, "completion stream failed");
                    this.upstream = None;
                    this.state = ReplyState::Errored;
                    return Poll::Ready(Some(Err(RagError::Completion(e))));
                }
                None => {
                    this.close();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl Drop for ReplyStream {
    fn drop(&mut self) {
        if matches!(self.state, ReplyState::Open | ReplyState::Streaming) {
            let _entered = self.span.enter();
            info!(
                bytes_sent = self.bytes_sent,
                "reply stream dropped before completion; releasing upstream"
            );
        }
    }
}
