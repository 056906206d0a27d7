use anyhow::{Context, Result};
use clap::Parser;
use devflow::config::{DevflowConfig, LoggingOverrides};
use devflow::logging::{AuditLogger, LogLevel};
use devflow::mcp::McpWorkflowServer;
use devflow::orchestration::PhaseOrchestrator;
use devflow::state_machine::WorkflowStateMachine;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devflow")]
#[command(about = "Phase workflow tracker with an audit log, served over MCP stdio")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.devflow/config.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum audit log level: error, warn, info or debug
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Directory for the JSONL audit log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Disable the console mirror of the audit log
    #[arg(long)]
    no_console: bool,

    /// Disable the JSONL audit log
    #[arg(long)]
    no_durable: bool,

    /// Session id recorded in every entry (default: random UUID)
    #[arg(long)]
    session_id: Option<String>,
}

impl Cli {
    fn overrides(&self) -> LoggingOverrides {
        LoggingOverrides {
            level: self.log_level,
            log_dir: self.log_dir.clone(),
            no_console: self.no_console,
            no_durable: self.no_durable,
            session_id: self.session_id.clone(),
        }
    }
}

fn init_tracing() {
    // stdout carries JSON-RPC, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = DevflowConfig::load_or_default(cli.config.as_deref())?;
    config.apply_env()?;
    config.apply_overrides(&cli.overrides());

    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let options = config.to_logger_options(&working_dir)?;
    // stdout is the JSON-RPC channel, so both console streams share stderr.
    let logger = Arc::new(AuditLogger::with_console_writers(
        options,
        Box::new(std::io::stderr()),
        Box::new(std::io::stderr()),
    ));
    if let Some(path) = logger.path() {
        tracing::info!("Audit log: {}", path.display());
    }
    logger.info(&format!("devflow {} started", env!("CARGO_PKG_VERSION")));

    let orchestrator = Arc::new(PhaseOrchestrator::new(WorkflowStateMachine::new(
        Arc::clone(&logger),
    )));
    let server = McpWorkflowServer::new(orchestrator, Arc::clone(&logger));

    let outcome = tokio::select! {
        result = server.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => result,
        _ = tokio::signal::ctrl_c() => {
            logger.warn("Interrupted, shutting down");
            Ok(())
        }
    };

    if let Err(e) = &outcome {
        logger.error(&format!("Server stopped: {:#}", e));
    }
    logger.info("devflow stopped");
    logger.close();
    outcome
}
