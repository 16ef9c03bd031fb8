//! Recording test doubles for the embedding, vector index, and completion services.

#![allow(dead_code)]

use async_trait::async_trait;
use embedding::EmbeddingService;
use futures::{stream, StreamExt};
use llm_client::{LlmClient, LlmStream, StreamChunk};
use rmp_core::{ChatMessage, RetrievalMatch};
use rmp_server::RagPipeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use vector_index::{QueryRequest, VectorIndex};

pub const TEST_SYSTEM_PROMPT: &str = "You recommend professors.";

pub struct RecordingEmbedder {
    pub calls: Mutex<Vec<String>>,
    pub vector: Vec<f32>,
    pub fail: bool,
}

impl RecordingEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            vector,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingService for RecordingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("embedding API error (503): overloaded");
        }
        Ok(self.vector.clone())
    }
}

pub struct RecordingIndex {
    pub calls: Mutex<Vec<QueryRequest>>,
    pub matches: Vec<RetrievalMatch>,
    pub fail: bool,
}

impl RecordingIndex {
    pub fn new(matches: Vec<RetrievalMatch>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            matches,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> Vec<QueryRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Vec<RetrievalMatch>> {
        self.calls.lock().unwrap().push(request);
        if self.fail {
            anyhow::bail!("Pinecone query error (401): Invalid API Key");
        }
        Ok(self.matches.clone())
    }
}

/// Sets its flag when dropped; moved into the scripted stream to observe release.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Replays a fixed chunk script. `Err(msg)` entries become stream errors.
pub struct ScriptedLlm {
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
    pub script: Vec<Result<String, String>>,
    pub released: Arc<AtomicBool>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: script
                .into_iter()
                .map(|r| r.map(str::to_string).map_err(str::to_string))
                .collect(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        Self::new(chunks.iter().map(|c| Ok(*c)).collect())
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> anyhow::Result<LlmStream> {
        self.calls.lock().unwrap().push(messages);
        let items: Vec<anyhow::Result<StreamChunk>> = self
            .script
            .iter()
            .map(|item| match item {
                Ok(content) => Ok(StreamChunk {
                    content: content.clone(),
                }),
                Err(msg) => Err(anyhow::anyhow!(msg.clone())),
            })
            .collect();
        let flag = DropFlag(self.released.clone());
        Ok(Box::pin(stream::iter(items).map(move |item| {
            let _ = &flag;
            item
        })))
    }
}

pub struct Harness {
    pub embedder: Arc<RecordingEmbedder>,
    pub index: Arc<RecordingIndex>,
    pub llm: Arc<ScriptedLlm>,
}

impl Harness {
    pub fn new(embedder: RecordingEmbedder, index: RecordingIndex, llm: ScriptedLlm) -> Self {
        Self {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
            llm: Arc::new(llm),
        }
    }

    pub fn pipeline(&self) -> RagPipeline {
        RagPipeline::new(
            self.embedder.clone(),
            self.index.clone(),
            self.llm.clone(),
            TEST_SYSTEM_PROMPT,
        )
    }

    pub fn no_service_called(&self) -> bool {
        self.embedder.calls().is_empty()
            && self.index.calls().is_empty()
            && self.llm.calls().is_empty()
    }
}

pub fn professors_abc() -> Vec<RetrievalMatch> {
    vec![
        RetrievalMatch::new("Prof A", "Math", 4.5),
        RetrievalMatch::new("Prof B", "Physics", 3.0),
        RetrievalMatch::new("Prof C", "Chemistry", 5.0),
    ]
}
