//! # Vector index
//!
//! Defines the [`VectorIndex`] interface used to fetch the professors nearest to a query
//! vector, and a Pinecone implementation ([`PineconeIndex`]) over its REST data plane.

use async_trait::async_trait;
use rmp_core::RetrievalMatch;

mod config;
mod pinecone;

pub use config::{PineconeConfig, DEFAULT_CONTROLLER_URL, DEFAULT_INDEX_NAME, DEFAULT_NAMESPACE};
pub use pinecone::PineconeIndex;

/// Number of neighbours requested per question.
pub const DEFAULT_TOP_K: usize = 5;

/// A nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_metadata: bool,
}

impl QueryRequest {
    /// Query for the `top_k` nearest records, with metadata.
    pub fn with_metadata(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            include_metadata: true,
        }
    }
}

/// Read-only similarity search over precomputed professor vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns up to `request.top_k` matches, most similar first. No score threshold is applied.
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Vec<RetrievalMatch>>;
}
