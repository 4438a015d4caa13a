// ibrecon - inter-branch clearing account reconciliation

mod exit_codes;
mod export;
mod recon;

use std::process::ExitCode;

use clap::Parser;
use interbranch_recon::ReconError;
use tracing_subscriber::EnvFilter;

use exit_codes::{recon_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "ibrecon")]
#[command(about = "Reconcile inter-branch clearing accounts from trial balance and ledger exports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log filter directives written to stderr (e.g. "debug", "interbranch_recon=debug")
    #[arg(long, global = true, env = "IBRECON_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: recon::ReconCommands,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  interbranch-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_tracing(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Also installs the `log` bridge, so engine records show up here.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match recon::cmd_recon(cli.command) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Create error from an engine error with its registry exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { .. } => Some(
                "map the export's header names under [columns.ledger] or [columns.trial_balance]"
                    .to_string(),
            ),
            ReconError::TooManyColumns { .. } => Some(
                "split the group, or reconcile its members individually".to_string(),
            ),
            ReconError::InvalidPeriod(_) => Some("use --period YYYY-MM, e.g. 2025-03".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
