//! Logging initialization: human-readable (or JSON) lines teed to stdout and a log file.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Local time in `YYYY-MM-DD HH:MM:SS` for human-readable log lines.
struct ChronoLocal;

impl FormatTime for ChronoLocal {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let t = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(w, "{} ", t)
    }
}

/// Initializes the global tracing subscriber.
///
/// Output goes to stdout and is appended to `log_file_path` (parent directories are created).
/// Level comes from `RUST_LOG` (e.g. `info`, `debug,tower_http=warn`); default `info`.
/// When `json` is true each event is one JSON object per line.
/// Load `.env` before calling so `RUST_LOG` is visible.
pub fn init_tracing(log_file_path: &str, json: bool) -> anyhow::Result<()> {
    init(log_file_path, json, true)
}

/// Like [`init_tracing`] but writes only to the log file, for interactive terminals.
pub fn init_file_tracing(log_file_path: &str) -> anyhow::Result<()> {
    init(log_file_path, false, false)
}

fn init(log_file_path: &str, json: bool, tee_stdout: bool) -> anyhow::Result<()> {
    if let Some(dir) = Path::new(log_file_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let file = Arc::new(file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = if tee_stdout {
        BoxMakeWriter::new(io::stdout.and(file))
    } else {
        BoxMakeWriter::new(file)
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_timer(ChronoLocal)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .with_ansi(false)
            .boxed()
    };

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// Masks an API key for safe logging: first 7 chars + `***` + last 4 chars.
/// Keys of 11 bytes or fewer are fully masked.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}
