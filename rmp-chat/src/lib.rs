//! # rmp-chat
//!
//! Terminal client for the Rate My Professor assistant. Keeps the transcript, gates sending on
//! the sign-in state, posts the transcript to `/api/chat`, and appends the streamed reply to
//! the last message as it arrives.

pub mod auth;
pub mod conversation;
pub mod markdown;
pub mod session;
pub mod transport;
pub mod utf8;

pub use auth::{gate_state, AuthSession, GateState, TokenSession};
pub use conversation::{append_to_last, Conversation, GREETING};
pub use markdown::{render, render_with, Theme};
pub use session::ChatSession;
pub use transport::{ByteStream, ChatTransport, HttpTransport};
pub use utf8::Utf8Decoder;
