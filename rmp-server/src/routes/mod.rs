//! Axum router construction.
//!
//! [`build`] assembles the application router:
//! - `GET /health`
//! - `POST /api/chat`, behind the optional bearer-token gate
//! - CORS and per-request trace-id layers around everything

mod chat;
mod health;

use axum::{middleware, Router};
use std::sync::Arc;

use crate::middleware::{auth, cors, trace};
use crate::state::AppState;

pub use chat::post_chat;
pub use health::get_health;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let chat = chat::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_chat_token,
    ));

    Router::new()
        .merge(health::router())
        .merge(chat)
        // Outermost layers execute first on the way in.
        .layer(cors::cors_layer(&state.config))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
