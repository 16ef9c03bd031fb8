//! `POST /api/chat`: transcript in, streamed plain-text reply out.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rmp_core::ChatMessage;
use std::sync::Arc;

use crate::error::ServerError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/chat", post(post_chat))
}

/// Body: JSON array of `{role, content}`. Response: raw UTF-8 text, chunked, no framing.
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<ChatMessage>>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(transcript) = payload?;
    let reply = state.pipeline.answer(&transcript).await?;
    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(reply),
    )
        .into_response())
}
