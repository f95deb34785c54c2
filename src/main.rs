//! BioBin controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  FileStore      FileSampleLog    LogEventSink   SystemClock  │
//! │  (StoragePort)  (SampleLog)      (EventSink)    (Clock)      │
//! │  HttpAdvisor / OfflineAdvisor (AdvisoryClient)               │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            AppService (domain core)                    │  │
//! │  │  SampleStore · ThresholdPolicy · DecisionEngine · FSM  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  stdin ─▶ AppCommand (JSON line) ─▶ AppResponse ─▶ stdout    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `biobin [config.json]`.  Logs go to stderr, filtered by
//! `BIOBIN_LOG`, then `RUST_LOG`, then `info`.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use biobin::adapters::file_store::FileStore;
use biobin::adapters::log_sink::LogEventSink;
use biobin::adapters::offline::OfflineAdvisor;
use biobin::adapters::sample_file::FileSampleLog;
use biobin::adapters::time::SystemClock;
use biobin::advisory::guard::GuardedAdvisor;
use biobin::app::commands::AppCommand;
use biobin::app::ports::AdvisoryClient;
use biobin::app::service::AppService;
use biobin::config::{AdvisoryConfig, ServiceConfig};

const SAMPLE_LOG_FILE: &str = "samples.jsonl";
const STATE_DIR: &str = "state";

fn init_logging() {
    let filter = std::env::var("BIOBIN_LOG")
        .ok()
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let Some(path) = path else {
        info!("no config file given, using defaults");
        return Ok(ServiceConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn advisory_client(config: &AdvisoryConfig) -> Result<Arc<dyn AdvisoryClient>> {
    match &config.endpoint {
        None => {
            warn!("no advisory endpoint configured; decisions use thresholds only");
            Ok(Arc::new(OfflineAdvisor))
        }
        #[cfg(feature = "http")]
        Some(endpoint) => {
            let client = biobin::adapters::http_advisory::HttpAdvisor::new(
                endpoint.as_str(),
                std::time::Duration::from_millis(config.timeout_ms),
            )
            .map_err(|e| anyhow::anyhow!("advisory endpoint {endpoint}: {e}"))?;
            info!("advisory provider: {endpoint}");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "http"))]
        Some(endpoint) => {
            warn!("advisory endpoint {endpoint} ignored: built without the `http` feature");
            Ok(Arc::new(OfflineAdvisor))
        }
    }
}

fn main() -> Result<()> {
    init_logging();

    let config_path = std::env::args_os().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;

    let storage = FileStore::open(config.data_dir.join(STATE_DIR))
        .with_context(|| format!("opening state store in {}", config.data_dir.display()))?;
    let sample_log = FileSampleLog::open(config.data_dir.join(SAMPLE_LOG_FILE))
        .with_context(|| format!("opening sample log in {}", config.data_dir.display()))?;
    let advisor = GuardedAdvisor::from_config(advisory_client(&config.advisory)?, &config.advisory);

    let service = AppService::open(
        Arc::new(storage),
        Box::new(sample_log),
        advisor,
        Arc::new(LogEventSink::new()),
        Arc::new(SystemClock),
    )
    .context("opening service")?
    .with_bin_depth(config.bin_depth_cm);

    // ── Line protocol: one JSON command in, one JSON response out ──
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<AppCommand>(&line) {
            Ok(cmd) => match service.handle_command(cmd) {
                Ok(resp) => serde_json::to_value(resp).context("encoding response")?,
                Err(e) => json!({"type": "error", "kind": error_kind(&e), "message": e.to_string()}),
            },
            Err(e) => json!({"type": "error", "kind": "bad_request", "message": e.to_string()}),
        };
        writeln!(stdout, "{reply}").context("writing stdout")?;
        stdout.flush().context("flushing stdout")?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

fn error_kind(e: &biobin::Error) -> &'static str {
    match e {
        biobin::Error::Validation(_) => "validation",
        biobin::Error::Storage(_) => "storage",
        biobin::Error::Transition(_) => "invalid_transition",
        biobin::Error::Config(_) => "config",
    }
}
