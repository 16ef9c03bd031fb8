//! Pinecone data-plane client: `POST https://{index host}/query`.
//!
//! The index host is either configured (`PINECONE_INDEX_HOST`) or looked up once with
//! `GET {controller}/indexes/{name}`.

use async_trait::async_trait;
use reqwest::Client;
use rmp_core::{mask_token, MatchMetadata, RetrievalMatch};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::{PineconeConfig, QueryRequest, VectorIndex};

const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2024-07";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pinecone index handle bound to one namespace.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    /// Base URL of the index data plane, with scheme.
    host: String,
    namespace: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Debug, Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

fn http_client() -> anyhow::Result<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Adds `https://` when the host comes without a scheme (as the controller returns it).
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

impl PineconeIndex {
    /// Builds a handle for a known index host.
    pub fn new(api_key: String, host: &str, namespace: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key,
            host: normalize_host(host),
            namespace,
        })
    }

    /// Builds a handle from config, resolving the index host through the controller if needed.
    #[instrument(skip(config), fields(index = %config.index_name, namespace = %config.namespace))]
    pub async fn connect(config: &PineconeConfig) -> anyhow::Result<Self> {
        let host = match &config.index_host {
            Some(host) => host.clone(),
            None => {
                describe_index_host(
                    &http_client()?,
                    &config.controller_url,
                    &config.api_key,
                    &config.index_name,
                )
                .await?
            }
        };
        let index = Self::new(config.api_key.clone(), &host, config.namespace.clone())?;
        info!(
            host = %index.host,
            api_key = %mask_token(&config.api_key),
            "Pinecone index ready"
        );
        Ok(index)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

async fn describe_index_host(
    client: &Client,
    controller_url: &str,
    api_key: &str,
    index_name: &str,
) -> anyhow::Result<String> {
    let url = format!(
        "{}/indexes/{}",
        controller_url.trim_end_matches('/'),
        index_name
    );
    let response = client
        .get(&url)
        .header("Api-Key", api_key)
        .header(API_VERSION_HEADER, API_VERSION)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "Pinecone describe index '{}' failed ({}): {}",
            index_name,
            status,
            error_text
        ));
    }

    let description: IndexDescription = response.json().await?;
    Ok(description.host)
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    #[instrument(skip(self, request), fields(top_k = request.top_k, dimension = request.vector.len()))]
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Vec<RetrievalMatch>> {
        info!(namespace = %self.namespace, "step: vector index query request");

        let body = QueryBody {
            namespace: &self.namespace,
            vector: &request.vector,
            top_k: request.top_k,
            include_metadata: request.include_metadata,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, "Pinecone query failed");
            return Err(anyhow::anyhow!("Pinecone query error ({}): {}", status, error_text));
        }

        let parsed: QueryResponse = response.json().await?;
        let matches: Vec<RetrievalMatch> = parsed
            .matches
            .into_iter()
            .map(|m| {
                if m.metadata.is_none() {
                    warn!(id = %m.id, "Pinecone match has no metadata");
                }
                RetrievalMatch {
                    id: m.id,
                    score: m.score,
                    metadata: m.metadata.unwrap_or_default(),
                }
            })
            .collect();

        info!(count = matches.len(), "step: vector index query done");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_host;

    #[test]
    fn host_without_scheme_gets_https() {
        assert_eq!(
            normalize_host("rag-abc123.svc.aped-4627-b74a.pinecone.io"),
            "https://rag-abc123.svc.aped-4627-b74a.pinecone.io"
        );
    }

    #[test]
    fn host_with_scheme_is_kept() {
        assert_eq!(normalize_host("http://127.0.0.1:5080/"), "http://127.0.0.1:5080");
    }
}
