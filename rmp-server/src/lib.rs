//! # rmp-server
//!
//! HTTP backend for the Rate My Professor chat. `POST /api/chat` takes the transcript, embeds
//! the last user turn, fetches the nearest professors from the vector index, appends them to
//! that turn, and streams the chat model's reply back as plain UTF-8 text.

pub mod config;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ServerConfig};
pub use error::ServerError;
pub use pipeline::{RagPipeline, ReplyState, ReplyStream};
pub use state::AppState;
