//! # rmp-core
//!
//! Core types shared by the chat server and the chat client: [`ChatMessage`], [`RetrievalMatch`],
//! error enums, and tracing initialization.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{ClientError, RagError, RequestError, Result};
pub use logger::{init_file_tracing, init_tracing, mask_token};
pub use types::{ChatMessage, MatchMetadata, MessageRole, RetrievalMatch};
