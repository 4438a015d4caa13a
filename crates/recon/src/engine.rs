use crate::config::{LedgerColumns, ReconConfig, TrialBalanceColumns};
use crate::context::ReconContext;
use crate::error::ReconError;
use crate::ledger::{aggregate, build_day_table};
use crate::model::{LedgerRow, LedgerSheet, TrialBalanceRow};
use crate::period::{normalize_date8, Period};
use crate::report::{
    analysis_payload, pair_summary, unmatched_listing, LedgerCounts, LedgerReport, ReportMeta,
    RunInfo, TrialBalanceReport, TrialBalanceSummary,
};
use crate::trial_balance::reconcile;
use crate::unmatched::extract_unmatched;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TrialBalanceInput {
    /// Informational only; trial-balance rows are already one period.
    pub period: Option<String>,
    pub rows: Vec<TrialBalanceRow>,
    pub grouping: bool,
}

#[derive(Debug, Clone)]
pub struct LedgerInput {
    pub period: Period,
    pub branch_a: String,
    pub branch_b: String,
    pub grouping: bool,
    pub ledger_a: LedgerSheet,
    pub ledger_b: LedgerSheet,
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Reconcile every configured branch pair from one trial balance.
pub fn run_trial_balance(
    config: &ReconConfig,
    input: &TrialBalanceInput,
) -> Result<TrialBalanceReport, ReconError> {
    let period = input
        .period
        .as_deref()
        .map(Period::parse)
        .transpose()?
        .map(|p| p.to_string());

    let ctx = ReconContext::from_config(config);
    let universe = config.branch_codes();
    let outcome = reconcile(&ctx, &input.rows, &universe, input.grouping)?;

    let pairs = pair_summary(&ctx.table, &outcome.pairs);
    let disagreeing = outcome.pairs.iter().filter(|p| !p.agrees()).count();
    log::debug!(
        "trial balance: {} pair(s), {disagreeing} disagreeing, {} row(s) skipped",
        pairs.len(),
        outcome.skipped.total()
    );

    Ok(TrialBalanceReport {
        meta: ReportMeta::new(&config.name, "trial_balance", input.grouping),
        period,
        summary: TrialBalanceSummary {
            pairs: pairs.len(),
            disagreeing,
        },
        pairs,
        skipped: outcome.skipped,
    })
}

/// Reconcile two branches' ledgers day by day for one period.
pub fn run_ledger(config: &ReconConfig, input: &LedgerInput) -> Result<LedgerReport, ReconError> {
    let ctx = ReconContext::from_config(config);
    let branch_a = ctx.table.canonicalize(&input.branch_a, input.grouping);
    let branch_b = ctx.table.canonicalize(&input.branch_b, input.grouping);
    if branch_a.is_empty() || branch_b.is_empty() {
        return Err(ReconError::InvalidInput(
            "both branch codes must be non-empty".into(),
        ));
    }
    if branch_a == branch_b {
        return Err(ReconError::InvalidInput(format!(
            "'{}' and '{}' are the same branch ({branch_a})",
            input.branch_a, input.branch_b
        )));
    }

    let period = input.period;
    let side_a = aggregate(&ctx, &input.ledger_a.rows, &branch_a, &branch_b, period, input.grouping);
    let side_b = aggregate(&ctx, &input.ledger_b.rows, &branch_b, &branch_a, period, input.grouping);
    let days = build_day_table(&ctx, period, &branch_a, &branch_b, &side_a, &side_b, input.grouping)?;

    let disagreeing = days.disagreeing_days();
    let unmatched = extract_unmatched(&side_a.rows, &side_b.rows, &disagreeing);
    log::debug!(
        "ledger {branch_a}/{branch_b} {period}: {} disagreeing day(s), {} + {} unmatched row(s)",
        disagreeing.len(),
        unmatched.a.len(),
        unmatched.b.len()
    );

    let counts = LedgerCounts {
        diff_days: disagreeing.len(),
        unmatch_count_a: unmatched.a.len(),
        unmatch_count_b: unmatched.b.len(),
        has_unmatch: !unmatched.is_empty(),
    };
    let listing = unmatched_listing(&input.ledger_a.headers, &input.ledger_b.headers, &unmatched);
    let analysis = (!unmatched.is_empty()).then(|| {
        analysis_payload(period, &branch_a, &branch_b, &days, &unmatched, &config.analysis)
    });

    Ok(LedgerReport {
        meta: ReportMeta::new(&config.name, "ledger", input.grouping),
        info: RunInfo::new(
            &ctx.table,
            period,
            (input.branch_a.as_str(), input.branch_b.as_str()),
            (branch_a.as_str(), branch_b.as_str()),
        ),
        counts,
        skipped_a: side_a.skipped,
        skipped_b: side_b.skipped,
        days,
        unmatched: listing,
        analysis,
    })
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// Parse an integer currency amount. Thousands separators are ignored, an
/// empty cell is zero, and a fractional part is accepted only if it is zero.
pub fn parse_amount(source: &str, row: usize, value: &str) -> Result<i64, ReconError> {
    let err = || ReconError::AmountParse {
        source: source.into(),
        row,
        value: value.into(),
    };
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    let whole = match cleaned.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
        Some(_) => return Err(err()),
        None => cleaned.as_str(),
    };
    whole.parse().map_err(|_| err())
}

fn read_headers(reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>, ReconError> {
    Ok(reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect())
}

fn column_index(source: &str, headers: &[String], name: &str) -> Result<usize, ReconError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReconError::MissingColumn {
            source: source.into(),
            column: name.into(),
        })
}

fn optional_index(
    source: &str,
    headers: &[String],
    name: Option<&str>,
) -> Result<Option<usize>, ReconError> {
    name.map(|n| column_index(source, headers, n)).transpose()
}

/// Load a general-ledger export. Every configured column must be present.
pub fn load_ledger_rows(
    source: &str,
    csv_data: &str,
    columns: &LedgerColumns,
) -> Result<LedgerSheet, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers = read_headers(&mut reader)?;
    let idx = |name: &str| column_index(source, &headers, name);

    let branch_idx = idx(&columns.branch_code)?;
    let account_idx = idx(&columns.account_code)?;
    let sub_code_idx = idx(&columns.sub_ledger_code)?;
    let sub_name_idx = idx(&columns.sub_ledger_name)?;
    let date_idx = idx(&columns.posting_date)?;
    let debit_idx = idx(&columns.debit)?;
    let credit_idx = idx(&columns.credit)?;
    let debit_tax_idx = optional_index(source, &headers, columns.debit_tax.as_deref())?;
    let credit_tax_idx = optional_index(source, &headers, columns.credit_tax.as_deref())?;
    let voucher_idx = optional_index(source, &headers, columns.voucher_no.as_deref())?;
    let description_idx = optional_index(source, &headers, columns.description.as_deref())?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let row_index = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();
        let opt_cell = |idx: Option<usize>| idx.map(cell).unwrap_or("");
        let amount = |idx: Option<usize>| parse_amount(source, row_index, opt_cell(idx));
        let overflow =
            |what: &str| ReconError::AmountOverflow(format!("{source}, row {row_index}: {what}"));

        let debit_amount = amount(Some(debit_idx))?
            .checked_add(amount(debit_tax_idx)?)
            .ok_or_else(|| overflow("debit plus tax"))?;
        let credit_amount = amount(Some(credit_idx))?
            .checked_add(amount(credit_tax_idx)?)
            .ok_or_else(|| overflow("credit plus tax"))?;
        if debit_amount.checked_sub(credit_amount).is_none() {
            return Err(overflow("debit minus credit"));
        }

        rows.push(LedgerRow {
            row_index,
            branch_code: cell(branch_idx).to_string(),
            account_code: cell(account_idx).to_string(),
            sub_ledger_code: cell(sub_code_idx).to_string(),
            sub_ledger_name: cell(sub_name_idx).to_string(),
            posting_date: normalize_date8(cell(date_idx)),
            debit_amount,
            credit_amount,
            voucher_no: opt_cell(voucher_idx).to_string(),
            description: opt_cell(description_idx).to_string(),
            cells: record.iter().map(str::to_string).collect(),
        });
    }

    log::debug!("{source}: loaded {} ledger row(s)", rows.len());
    Ok(LedgerSheet { headers, rows })
}

/// Load a trial-balance export.
pub fn load_trial_balance_rows(
    source: &str,
    csv_data: &str,
    columns: &TrialBalanceColumns,
) -> Result<Vec<TrialBalanceRow>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers = read_headers(&mut reader)?;
    let idx = |name: &str| column_index(source, &headers, name);

    let branch_idx = idx(&columns.branch_code)?;
    let account_idx = idx(&columns.account_code)?;
    let sub_code_idx = idx(&columns.sub_ledger_code)?;
    let sub_name_idx = idx(&columns.sub_ledger_name)?;
    let balance_idx = idx(&columns.ending_balance)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();
        rows.push(TrialBalanceRow {
            branch_code: cell(branch_idx).to_string(),
            account_code: cell(account_idx).to_string(),
            sub_ledger_code: cell(sub_code_idx).to_string(),
            sub_ledger_name: cell(sub_name_idx).to_string(),
            ending_balance: parse_amount(source, i + 2, cell(balance_idx))?,
        });
    }

    log::debug!("{source}: loaded {} trial balance row(s)", rows.len());
    Ok(rows)
}
