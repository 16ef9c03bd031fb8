use thiserror::Error;

/// Failures of the retrieval-augmented completion pipeline.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Embedding error: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Vector index error: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("Completion error: {0}")]
    Completion(#[source] anyhow::Error),
}

/// Reasons a transcript is rejected before any external service is called.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("conversation is empty")]
    EmptyConversation,

    #[error("last message must have role user, got {0}")]
    LastMessageNotUser(String),

    #[error("message too large ({size} bytes); maximum is {max} bytes")]
    MessageTooLarge { size: usize, max: usize },
}

/// Failures seen by the chat client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("You must be signed in to send a message")]
    NotSignedIn,

    #[error("Session is still loading")]
    NotLoaded,

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, RagError>;
