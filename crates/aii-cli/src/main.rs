use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use aii_agent::InvestigatorAgent;
use aii_core::{SettingsStore, TelemetryClient};
use aii_llm::OpenAiBackend;
use aii_telemetry::AppInsightsClient;

mod shell;

use shell::Shell;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose: all tracing
    Trace,
    /// Verbose: outbound requests and responses
    Debug,
    /// Standard: high-level flow
    Info,
    /// Quiet: only warnings and errors
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "aii")]
#[command(author, version, about = "App Insight Investigator - LLM-powered telemetry analysis", long_about = None)]
pub struct Cli {
    /// Settings file to use (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// System prompt file (defaults to Investigator.md in the working directory)
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(short, long)]
    pub debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.as_filter()))
        .with_writer(std::io::stderr)
        .init();

    let store = match cli.config {
        Some(path) => SettingsStore::with_path(path),
        None => SettingsStore::open(),
    }
    .context("Failed to open settings")?;
    let store = Arc::new(store);

    let telemetry: Arc<dyn TelemetryClient> = Arc::new(AppInsightsClient::new(store.clone()));
    let backend = Arc::new(OpenAiBackend::new(store.clone()));

    let mut agent = InvestigatorAgent::new(backend, telemetry.clone());
    if let Some(path) = cli.prompt_file {
        agent = agent.with_prompt_path(path);
    }

    let mut shell = Shell::new(store, telemetry, agent)?;
    shell.run().await
}
