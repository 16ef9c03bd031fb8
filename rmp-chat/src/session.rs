//! One signed-in chat: conversation state, auth gate, and the streaming send loop.

use futures::StreamExt;
use rmp_core::ClientError;
use tracing::{info, warn};

use crate::auth::AuthSession;
use crate::conversation::Conversation;
use crate::transport::ChatTransport;
use crate::utf8::Utf8Decoder;

pub struct ChatSession<T, A> {
    transport: T,
    auth: A,
    conversation: Conversation,
}

impl<T: ChatTransport, A: AuthSession> ChatSession<T, A> {
    pub fn new(transport: T, auth: A) -> Self {
        Self {
            transport,
            auth,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Sends `text` and appends the streamed reply to the assistant placeholder.
    ///
    /// `on_piece` sees each decoded piece as it arrives. Without a signed-in session nothing is
    /// sent and the conversation is unchanged. On a read failure the partial reply is kept.
    pub async fn send_message<F>(&mut self, text: &str, mut on_piece: F) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        if !self.auth.is_loaded() {
            return Err(ClientError::NotLoaded);
        }
        if !self.auth.is_signed_in() {
            warn!("{}", ClientError::NotSignedIn);
            return Err(ClientError::NotSignedIn);
        }

        let (next, request) = self.conversation.with_user_turn(text);
        self.conversation = next;

        let mut body = self
            .transport
            .send(&request, self.auth.bearer_token())
            .await?;

        let mut decoder = Utf8Decoder::new();
        let mut received = 0usize;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    received += bytes.len();
                    self.push_piece(&decoder.decode(&bytes), &mut on_piece);
                }
                Err(e) => {
                    self.push_piece(&decoder.finish(), &mut on_piece);
                    warn!(error = %e, received, "reply stream failed; keeping partial reply");
                    return Err(e);
                }
            }
        }
        self.push_piece(&decoder.finish(), &mut on_piece);
        info!(received, "step: reply complete");
        Ok(())
    }

    /// Signs out and starts over from the greeting.
    pub fn sign_out(&mut self) {
        self.auth.sign_out();
        self.conversation = Conversation::new();
    }

    fn push_piece<F: FnMut(&str)>(&mut self, piece: &str, on_piece: &mut F) {
        if piece.is_empty() {
            return;
        }
        self.conversation = self.conversation.append_to_last(piece);
        on_piece(piece);
    }
}
