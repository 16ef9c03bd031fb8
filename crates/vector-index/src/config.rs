//! Pinecone configuration loaded from the environment.

use anyhow::Result;
use std::env;

pub const DEFAULT_INDEX_NAME: &str = "rag";
pub const DEFAULT_NAMESPACE: &str = "ns1";
pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// PINECONE_API_KEY
    pub api_key: String,
    /// PINECONE_INDEX
    pub index_name: String,
    /// PINECONE_NAMESPACE
    pub namespace: String,
    /// PINECONE_INDEX_HOST; when unset the host is looked up through the controller.
    pub index_host: Option<String>,
    /// PINECONE_CONTROLLER_URL
    pub controller_url: String,
}

impl PineconeConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let non_empty = |key: &str| env::var(key).ok().filter(|s| !s.trim().is_empty());
        Ok(Self {
            api_key: env::var("PINECONE_API_KEY").unwrap_or_default(),
            index_name: non_empty("PINECONE_INDEX")
                .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            namespace: non_empty("PINECONE_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            index_host: non_empty("PINECONE_INDEX_HOST"),
            controller_url: non_empty("PINECONE_CONTROLLER_URL")
                .unwrap_or_else(|| DEFAULT_CONTROLLER_URL.to_string()),
        })
    }

    /// Validate config: API key required, URLs must parse.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("PINECONE_API_KEY is required. Set it in .env or environment.");
        }
        if reqwest::Url::parse(&self.controller_url).is_err() {
            anyhow::bail!(
                "PINECONE_CONTROLLER_URL is not a valid URL: {}",
                self.controller_url
            );
        }
        Ok(())
    }
}
