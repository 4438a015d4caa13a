//! `ibrecon tb|ledger|validate`: config-driven clearing account reconciliation.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use interbranch_recon::engine::{
    load_ledger_rows, load_trial_balance_rows, run_ledger, run_trial_balance, LedgerInput,
    TrialBalanceInput,
};
use interbranch_recon::report::day_table_records;
use interbranch_recon::{LedgerReport, Period, ReconConfig, TrialBalanceReport};

use crate::exit_codes::{EXIT_DIFFS, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME};
use crate::export::{output_path, print_records, to_json, write_json, write_records};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile every branch pair from one period's trial balance
    #[command(after_help = "\
Examples:
  ibrecon tb tb-2025-03.csv --config recon.toml
  ibrecon tb tb-2025-03.csv --config recon.toml --period 2025-03 --output pairs.csv
  ibrecon tb tb-2025-03.csv --config recon.toml --no-grouping --json")]
    Tb {
        /// Trial balance export (CSV)
        input: PathBuf,

        /// Path to the recon TOML config
        #[arg(long)]
        config: PathBuf,

        /// Period label for the report (YYYY-MM)
        #[arg(long)]
        period: Option<String>,

        /// Reconcile group members individually instead of as one unit
        #[arg(long)]
        no_grouping: bool,

        /// Output the full report as JSON to stdout instead of CSV
        #[arg(long)]
        json: bool,

        /// Write the pair summary CSV to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Reconcile two branches' general ledgers day by day
    #[command(after_help = "\
Writes into --out-dir:
  ledger-match_<period>_<A>-<B>.csv     day table for every day of the period
  ledger-info_<period>_<A>-<B>.csv      period and branch names
  ledger-unmatch_<period>_<A>-<B>.csv   unmatched entries (only if any)
  ledger-analysis_<period>_<A>-<B>.json analysis payload (only if any)

Examples:
  ibrecon ledger gl-101.csv gl-401.csv --config recon.toml --period 2025-03 \\
      --branch-a 050000101 --branch-b 050000401
  ibrecon ledger gl-101.csv gl-401.csv --config recon.toml --period 2025-03 \\
      --branch-a 050000101 --branch-b KOBE --grouping --out-dir out/")]
    Ledger {
        /// General ledger export of branch A (CSV)
        ledger_a: PathBuf,

        /// General ledger export of branch B (CSV)
        ledger_b: PathBuf,

        /// Path to the recon TOML config
        #[arg(long)]
        config: PathBuf,

        /// Period to reconcile (YYYY-MM)
        #[arg(long)]
        period: String,

        /// Branch code whose ledger is LEDGER_A
        #[arg(long)]
        branch_a: String,

        /// Branch code whose ledger is LEDGER_B
        #[arg(long)]
        branch_b: String,

        /// Collapse aggregation groups into their representative
        #[arg(long)]
        grouping: bool,

        /// Directory for the output files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Also print the full report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  ibrecon validate recon.toml")]
    Validate {
        /// Path to the recon TOML config
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Tb {
            input,
            config,
            period,
            no_grouping,
            json,
            output,
        } => cmd_tb(&input, &config, period, !no_grouping, json, output),
        ReconCommands::Ledger {
            ledger_a,
            ledger_b,
            config,
            period,
            branch_a,
            branch_b,
            grouping,
            out_dir,
            json,
        } => cmd_ledger(LedgerArgs {
            ledger_a,
            ledger_b,
            config,
            period,
            branch_a,
            branch_b,
            grouping,
            out_dir,
            json,
        }),
        ReconCommands::Validate { config } => cmd_validate(&config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn read_file(path: &Path, what: &str) -> Result<String, CliError> {
    tracing::debug!(path = %path.display(), "reading {what}");
    std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read {what} {}: {e}", path.display())))
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = read_file(path, "config")?;
    ReconConfig::from_toml(&config_str).map_err(|e| {
        recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string())
            .with_hint(format!("check {}; run `ibrecon validate` to re-check", path.display()))
    })
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// tb
// ============================================================================

fn cmd_tb(
    input_path: &Path,
    config_path: &Path,
    period: Option<String>,
    grouping: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let csv_data = read_file(input_path, "trial balance")?;
    let rows = load_trial_balance_rows(
        &source_name(input_path),
        &csv_data,
        &config.columns.trial_balance,
    )
    .map_err(CliError::recon)?;

    let input = TrialBalanceInput { period, rows, grouping };
    let report = run_trial_balance(&config, &input).map_err(CliError::recon)?;

    if let Some(ref path) = output_file {
        write_records(path, &report.records())?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{}", to_json(&report)?);
    } else if output_file.is_none() {
        print_records(&report.records())?;
    }

    print_tb_summary(&report);

    if report.summary.disagreeing > 0 {
        return Err(recon_err(
            EXIT_DIFFS,
            format!("{} branch pair(s) disagree", report.summary.disagreeing),
        ));
    }
    Ok(())
}

fn print_tb_summary(report: &TrialBalanceReport) {
    let s = &report.summary;
    eprintln!(
        "trial balance{}: {} pairs, {} disagreeing, {} rows skipped",
        report
            .period
            .as_deref()
            .map(|p| format!(" {p}"))
            .unwrap_or_default(),
        s.pairs,
        s.disagreeing,
        report.skipped.total(),
    );
    for pair in report.disagreeing() {
        eprintln!(
            "  {} {} / {} {}: {} + {} = {}",
            pair.left_branch,
            pair.left_branch_name,
            pair.right_branch,
            pair.right_branch_name,
            pair.left_amount,
            pair.right_amount,
            pair.diff,
        );
    }
    if report.skipped.unresolved > 0 {
        eprintln!(
            "warning: {} clearing rows have no resolvable counterparty",
            report.skipped.unresolved
        );
    }
}

// ============================================================================
// ledger
// ============================================================================

struct LedgerArgs {
    ledger_a: PathBuf,
    ledger_b: PathBuf,
    config: PathBuf,
    period: String,
    branch_a: String,
    branch_b: String,
    grouping: bool,
    out_dir: PathBuf,
    json: bool,
}

fn cmd_ledger(args: LedgerArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let period = Period::parse(&args.period).map_err(CliError::recon)?;

    let columns = &config.columns.ledger;
    let ledger_a = load_ledger_rows(
        &source_name(&args.ledger_a),
        &read_file(&args.ledger_a, "ledger")?,
        columns,
    )
    .map_err(CliError::recon)?;
    let ledger_b = load_ledger_rows(
        &source_name(&args.ledger_b),
        &read_file(&args.ledger_b, "ledger")?,
        columns,
    )
    .map_err(CliError::recon)?;

    let input = LedgerInput {
        period,
        branch_a: args.branch_a,
        branch_b: args.branch_b,
        grouping: args.grouping,
        ledger_a,
        ledger_b,
    };
    let report = run_ledger(&config, &input).map_err(CliError::recon)?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        recon_err(
            EXIT_RECON_RUNTIME,
            format!("cannot create {}: {e}", args.out_dir.display()),
        )
    })?;
    for path in write_ledger_outputs(&args.out_dir, &report)? {
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{}", to_json(&report)?);
    }

    print_ledger_summary(&report);

    if !report.reconciled() {
        return Err(recon_err(
            EXIT_DIFFS,
            format!("{} day(s) disagree", report.counts.diff_days),
        ));
    }
    Ok(())
}

fn write_ledger_outputs(dir: &Path, report: &LedgerReport) -> Result<Vec<PathBuf>, CliError> {
    let info = &report.info;
    let mut written = Vec::new();

    let path = output_path(dir, &info.day_table_stem(), "csv");
    write_records(&path, &day_table_records(&report.days))?;
    written.push(path);

    let path = output_path(dir, &info.info_stem(), "csv");
    write_records(&path, &info.records())?;
    written.push(path);

    if let Some(ref listing) = report.unmatched {
        let path = output_path(dir, &info.unmatched_stem(), "csv");
        write_records(&path, &listing.records())?;
        written.push(path);
    }

    if let Some(ref analysis) = report.analysis {
        let path = output_path(dir, &info.analysis_stem(), "json");
        write_json(&path, analysis)?;
        written.push(path);
    }

    Ok(written)
}

fn print_ledger_summary(report: &LedgerReport) {
    let info = &report.info;
    let counts = &report.counts;
    eprintln!(
        "ledger {} {} {} / {} {}: {} disagreeing days, {} + {} unmatched entries",
        info.period,
        info.branch_a,
        info.branch_a_name,
        info.branch_b,
        info.branch_b_name,
        counts.diff_days,
        counts.unmatch_count_a,
        counts.unmatch_count_b,
    );
    for row in report.days.rows.iter().filter(|r| r.disagrees()) {
        eprintln!(
            "  {}: {} + {} = {}",
            row.date.format("%Y-%m-%d"),
            row.sum_a,
            row.sum_b,
            row.diff
        );
    }
    let mut skipped = report.skipped_a;
    skipped += report.skipped_b;
    eprintln!("{} rows skipped", skipped.total());
    if skipped.unresolved > 0 {
        eprintln!(
            "warning: {} clearing rows have no resolvable counterparty",
            skipped.unresolved
        );
    }
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    eprintln!(
        "valid: \"{}\" ({} branches, {} groups, {} sub-ledger codes)",
        config.name,
        config.branches.len(),
        config.groups.len(),
        config.sub_ledgers.len(),
    );
    Ok(())
}
