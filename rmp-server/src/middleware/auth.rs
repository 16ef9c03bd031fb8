use crate::error::ServerError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

/// Requires `Authorization: Bearer <RMP_CHAT_TOKEN>` when a chat token is configured.
pub async fn require_chat_token(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = state.config.chat_token.as_deref() {
        let provided = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if provided != Some(expected) {
            warn!(has_header = provided.is_some(), "rejected chat request without valid token");
            return ServerError::Unauthorized.into_response();
        }
    }
    next.run(req).await
}
