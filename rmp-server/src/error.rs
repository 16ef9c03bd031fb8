//! Unified server error type.
//!
//! Handlers return `Result<T, ServerError>`, which implements [`IntoResponse`] as a JSON body
//! `{"error": "..."}`. Upstream failures (embedding, vector index, completion) are logged in
//! full; the caller only sees which stage failed.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rmp_core::RagError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed body or a transcript the pipeline refuses.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong bearer token on a protected route.
    #[error("unauthorised")]
    Unauthorized,

    /// An external service failed before the reply stream started.
    #[error("upstream error: {0}")]
    Upstream(#[source] RagError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let client_message = match &self {
            ServerError::BadRequest(m) => m.clone(),
            ServerError::Unauthorized => "unauthorised".to_owned(),
            ServerError::Upstream(e) => {
                error!(error = ?e, "upstream service failed");
                match e {
                    RagError::Embedding(_) => "embedding service unavailable",
                    RagError::Retrieval(_) => "vector index unavailable",
                    _ => "completion service unavailable",
                }
                .to_owned()
            }
        };
        (self.status(), Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<RagError> for ServerError {
    fn from(e: RagError) -> Self {
        match e {
            RagError::InvalidRequest(reason) => ServerError::BadRequest(reason.to_string()),
            other => ServerError::Upstream(other),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}
