//! rmp-server: entry point.
//!
//! Startup order:
//! 1. Load `.env` and configuration; apply CLI overrides.
//! 2. Initialise tracing (stdout + log file).
//! 3. Build the embedding, vector index, and completion clients.
//! 4. Serve the Axum router with graceful shutdown.

use anyhow::Result;
use clap::Parser;
use llm_client::OpenAILlmClient;
use openai_embedding::OpenAIEmbedding;
use rmp_core::{init_tracing, mask_token};
use rmp_server::{routes, AppConfig, AppState, RagPipeline};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use vector_index::PineconeIndex;

#[derive(Parser)]
#[command(name = "rmp-server")]
#[command(about = "Rate My Professor chat backend: POST /api/chat streams a retrieval-augmented reply", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to bind; overrides RMP_BIND.
    #[arg(short, long)]
    bind: Option<String>,
    /// Log file path; overrides RMP_LOG_FILE.
    #[arg(long)]
    log_file: Option<String>,
    /// Emit JSON log lines; overrides RMP_LOG_JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(log_file) = cli.log_file {
        config.server.log_file = log_file;
    }
    config.server.log_json |= cli.log_json;

    init_tracing(&config.server.log_file, config.server.log_json)?;
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        embedding_model = %config.embedding.embedding_model,
        model = %config.llm.llm_model,
        index = %config.pinecone.index_name,
        namespace = %config.pinecone.namespace,
        openai_key = %mask_token(&config.llm.openai_api_key),
        chat_token = config.server.chat_token.is_some(),
        "rmp-server starting"
    );

    let embedder = Arc::new(OpenAIEmbedding::from_config(&config.embedding));
    let index = Arc::new(PineconeIndex::connect(&config.pinecone).await?);
    let llm = Arc::new(OpenAILlmClient::from_config(&config.llm));
    let pipeline = RagPipeline::new(embedder, index, llm, config.server.system_prompt.as_str());

    let addr: SocketAddr = config.server.bind_address.parse()?;
    let state = Arc::new(AppState::new(config.server, pipeline));
    let app = routes::build(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("rmp-server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
