//! Transcript state. Every update returns a new value; nothing is modified in place.

use rmp_core::ChatMessage;

/// First assistant message shown before the student types anything.
pub const GREETING: &str =
    "Hi! I'm the Rate My Professor support assistant. How can I help you today?";

/// Returns `messages` with `piece` appended to the content of the last element.
///
/// The other elements are cloned unchanged. An empty slice yields an empty vector.
pub fn append_to_last(messages: &[ChatMessage], piece: &str) -> Vec<ChatMessage> {
    let Some((last, rest)) = messages.split_last() else {
        return Vec::new();
    };
    let mut updated = Vec::with_capacity(messages.len());
    updated.extend_from_slice(rest);
    updated.push(ChatMessage {
        role: last.role,
        content: format!("{}{}", last.content, piece),
    });
    updated
}

/// Ordered chat messages as displayed to the student.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A conversation holding only the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Starts a turn: returns the next state (with the user message and an empty assistant
    /// placeholder) and the request body (prior messages plus the user message, no placeholder).
    pub fn with_user_turn(&self, text: &str) -> (Conversation, Vec<ChatMessage>) {
        let mut request = self.messages.clone();
        request.push(ChatMessage::user(text));

        let mut messages = request.clone();
        messages.push(ChatMessage::assistant(""));
        (Conversation { messages }, request)
    }

    /// Returns the next state with `piece` appended to the last message.
    pub fn append_to_last(&self, piece: &str) -> Conversation {
        Conversation {
            messages: append_to_last(&self.messages, piece),
        }
    }
}
