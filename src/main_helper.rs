use crate::config::Settings;
use crate::hardening::RetryPolicy;
use crate::types::Result;
use crate::upstream::ModelBackend;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    /// Skip the Basic-Auth gate
    #[arg(long, global = true, default_value_t = false)]
    pub disable_auth: bool,
    /// Treat non-JSON model output as an error instead of a warning
    #[arg(long, global = true, default_value_t = false)]
    pub reject_unparseable: bool,
    #[arg(long, global = true)]
    pub system_prompt_file: Option<PathBuf>,
    #[arg(long, global = true, default_value = crate::constants::ANTHROPIC_BASE_URL)]
    pub anthropic_base_url: String,
    /// Total upstream attempts per invocation (1 = no retries)
    #[arg(
        long,
        global = true,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=crate::constants::MAX_UPSTREAM_ATTEMPTS as i64)
    )]
    pub max_attempts: u32,
    #[arg(long, global = true, default_value_t = 120)]
    pub request_timeout_secs: u64,
    #[arg(long, global = true, default_value_t = 10)]
    pub connect_timeout_secs: u64,
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,
    /// Also write a daily-rolling log file into this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the quiz endpoint over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 1024 * 1024)]
        max_body_size: usize,
    },
    /// Run a single invocation event and print the envelope
    Invoke {
        /// Path to the event JSON, or `-` for stdin
        #[arg(long)]
        event: PathBuf,
    },
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub backend: Arc<dyn ModelBackend>,
    pub retry: Arc<RetryPolicy>,
}

impl AppState {
    pub fn new(settings: Settings, backend: Arc<dyn ModelBackend>, retry: RetryPolicy) -> Self {
        Self {
            settings: Arc::new(settings),
            backend,
            retry: Arc::new(retry),
        }
    }
}

/// Reads an invocation event from a file, or from stdin when the path is `-`.
pub fn read_event(path: &Path) -> Result<serde_json::Value> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}
