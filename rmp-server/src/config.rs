//! Server configuration, loaded from environment variables at startup.

use anyhow::{Context, Result};
use embedding::EnvEmbeddingConfig;
use llm_client::EnvLlmConfig;
use std::net::SocketAddr;
use vector_index::PineconeConfig;

/// HTTP-facing settings for rmp-server.
///
/// Every field has a default so only the API keys need to be set.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,
    /// Append-only log file, teed with stdout.
    pub log_file: String,
    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
    /// Comma-separated allowed origins; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,
    /// Bearer token required on `/api/chat`; `None` leaves the endpoint open.
    pub chat_token: Option<String>,
    /// System instruction placed first in every completion request.
    pub system_prompt: String,
}

impl ServerConfig {
    /// Build [`ServerConfig`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("RMP_BIND", "0.0.0.0:3000"),
            log_file: env_or("RMP_LOG_FILE", "logs/rmp-server.log"),
            log_json: std::env::var("RMP_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_allowed_origins: env_opt("RMP_CORS_ORIGINS"),
            chat_token: env_opt("RMP_CHAT_TOKEN"),
            system_prompt: env_opt("RMP_SYSTEM_PROMPT")
                .unwrap_or_else(|| prompt::SYSTEM_PROMPT.to_owned()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_address
            .parse::<SocketAddr>()
            .with_context(|| format!("RMP_BIND is not a socket address: {}", self.bind_address))?;
        Ok(())
    }
}

/// Everything the server binary needs: HTTP settings plus each service's config.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub embedding: EnvEmbeddingConfig,
    pub llm: EnvLlmConfig,
    pub pinecone: PineconeConfig,
}

impl AppConfig {
    /// Loads every section from the environment. Call [`AppConfig::validate`] before use.
    pub fn load() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env(),
            embedding: EnvEmbeddingConfig::from_env()?,
            llm: EnvLlmConfig::from_env()?,
            pinecone: PineconeConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.embedding.validate()?;
        self.llm.validate()?;
        self.pinecone.validate()?;
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
