//! Sign-in gate. The identity provider is abstracted as [`AuthSession`].

use std::env;

/// Sign-in page used when `RMP_SIGN_IN_URL` is unset.
pub const DEFAULT_SIGN_IN_URL: &str = "http://127.0.0.1:3000/sign-in";

/// What an identity provider exposes to the chat client.
pub trait AuthSession: Send + Sync {
    /// False while the provider is still resolving the session.
    fn is_loaded(&self) -> bool;
    fn is_signed_in(&self) -> bool;
    /// Where to send the user to sign in.
    fn redirect_to_sign_in(&self) -> String;
    /// Credential attached to chat requests, when signed in.
    fn bearer_token(&self) -> Option<&str>;
    fn sign_out(&mut self);
}

/// What the client should show for a given session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Show "Loading...".
    Loading,
    /// Send the user to the sign-in page; the chat is not shown.
    SignedOut,
    SignedIn,
}

pub fn gate_state(auth: &dyn AuthSession) -> GateState {
    if !auth.is_loaded() {
        GateState::Loading
    } else if auth.is_signed_in() {
        GateState::SignedIn
    } else {
        GateState::SignedOut
    }
}

/// Session backed by a pre-issued token (`RMP_SESSION_TOKEN`).
#[derive(Debug, Clone)]
pub struct TokenSession {
    token: Option<String>,
    sign_in_url: String,
}

impl TokenSession {
    pub fn new(token: Option<String>, sign_in_url: impl Into<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            sign_in_url: sign_in_url.into(),
        }
    }

    /// Load from `RMP_SESSION_TOKEN` and `RMP_SIGN_IN_URL`.
    pub fn from_env() -> Self {
        let token = env::var("RMP_SESSION_TOKEN").ok();
        let sign_in_url = env::var("RMP_SIGN_IN_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SIGN_IN_URL.to_string());
        Self::new(token, sign_in_url)
    }
}

impl AuthSession for TokenSession {
    fn is_loaded(&self) -> bool {
        true
    }

    fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn redirect_to_sign_in(&self) -> String {
        self.sign_in_url.clone()
    }

    fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn sign_out(&mut self) {
        self.token = None;
    }
}
