//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::pipeline::RagPipeline;

/// Immutable after startup; requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(config: ServerConfig, pipeline: RagPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}
