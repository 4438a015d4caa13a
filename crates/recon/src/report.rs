//! Output-ready tables and the analysis payload.
//!
//! Every table renders to `Vec<Vec<String>>` records so any tabular writer
//! (CSV here, a spreadsheet elsewhere) can emit it without knowing the model.

use serde::Serialize;

use crate::branch::BranchTable;
use crate::config::AnalysisConfig;
use crate::model::{DayTable, LedgerRow, PairResult, SkipCounts, UnmatchedRows};
use crate::period::{date8, Period};

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub mode: &'static str,
    pub engine_version: String,
    pub grouping: bool,
}

impl ReportMeta {
    pub fn new(config_name: &str, mode: &'static str, grouping: bool) -> Self {
        Self {
            config_name: config_name.to_string(),
            mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            grouping,
        }
    }
}

// ---------------------------------------------------------------------------
// Pair summary
// ---------------------------------------------------------------------------

pub const PAIR_SUMMARY_HEADER: [&str; 7] = [
    "leftBranch",
    "leftBranchName",
    "rightBranch",
    "rightBranchName",
    "leftAmount",
    "rightAmount",
    "diff",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairSummaryRow {
    pub left_branch: String,
    pub left_branch_name: String,
    pub right_branch: String,
    pub right_branch_name: String,
    pub left_amount: i64,
    pub right_amount: i64,
    pub diff: i64,
}

impl PairSummaryRow {
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.left_branch.clone(),
            self.left_branch_name.clone(),
            self.right_branch.clone(),
            self.right_branch_name.clone(),
            self.left_amount.to_string(),
            self.right_amount.to_string(),
            self.diff.to_string(),
        ]
    }
}

pub fn pair_summary(table: &BranchTable, pairs: &[PairResult]) -> Vec<PairSummaryRow> {
    pairs
        .iter()
        .map(|p| PairSummaryRow {
            left_branch: p.left_branch.clone(),
            left_branch_name: table.display_name(&p.left_branch),
            right_branch: p.right_branch.clone(),
            right_branch_name: table.display_name(&p.right_branch),
            left_amount: p.left_amount,
            right_amount: p.right_amount,
            diff: p.diff,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceSummary {
    pub pairs: usize,
    pub disagreeing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceReport {
    pub meta: ReportMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub summary: TrialBalanceSummary,
    pub pairs: Vec<PairSummaryRow>,
    pub skipped: SkipCounts,
}

impl TrialBalanceReport {
    pub fn disagreeing(&self) -> impl Iterator<Item = &PairSummaryRow> {
        self.pairs.iter().filter(|p| p.diff != 0)
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        let mut out = vec![PAIR_SUMMARY_HEADER.iter().map(|h| h.to_string()).collect()];
        out.extend(self.pairs.iter().map(PairSummaryRow::to_record));
        out
    }
}

// ---------------------------------------------------------------------------
// Day table
// ---------------------------------------------------------------------------

pub fn day_table_header(days: &DayTable) -> Vec<String> {
    let mut header = vec!["date".to_string()];
    header.extend(days.columns_a.iter().map(|c| format!("Sub:A_{c}")));
    header.extend(days.columns_b.iter().map(|c| format!("Sub:B_{c}")));
    header.extend(["sumA", "sumB", "diff"].map(String::from));
    header
}

/// Header plus one record per day. Breakdown cells with no entries are blank.
pub fn day_table_records(days: &DayTable) -> Vec<Vec<String>> {
    let cell = |v: &Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
    let mut out = vec![day_table_header(days)];
    for row in &days.rows {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
        record.extend(row.breakdown_a.iter().map(cell));
        record.extend(row.breakdown_b.iter().map(cell));
        record.push(row.sum_a.to_string());
        record.push(row.sum_b.to_string());
        record.push(row.diff.to_string());
        out.push(record);
    }
    out
}

// ---------------------------------------------------------------------------
// Unmatched listing
// ---------------------------------------------------------------------------

/// Side-by-side unmatched rows: A's columns on the left, B's on the right.
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedListing {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UnmatchedListing {
    pub fn records(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.header.clone());
        out.extend(self.rows.iter().cloned());
        out
    }
}

/// `None` when nothing is unmatched.
pub fn unmatched_listing(
    headers_a: &[String],
    headers_b: &[String],
    unmatched: &UnmatchedRows,
) -> Option<UnmatchedListing> {
    if unmatched.is_empty() {
        return None;
    }

    let mut header: Vec<String> = headers_a.iter().map(|h| format!("A:{h}")).collect();
    header.extend(headers_b.iter().map(|h| format!("B:{h}")));

    let block = |row: &LedgerRow, width: usize| {
        let mut cells = row.cells.clone();
        cells.resize(width, String::new());
        cells
    };

    let mut rows = Vec::with_capacity(unmatched.a.len() + unmatched.b.len());
    for a in &unmatched.a {
        let mut record = block(a, headers_a.len());
        record.resize(headers_a.len() + headers_b.len(), String::new());
        rows.push(record);
    }
    for b in &unmatched.b {
        let mut record = vec![String::new(); headers_a.len()];
        record.extend(block(b, headers_b.len()));
        rows.push(record);
    }

    Some(UnmatchedListing { header, rows })
}

// ---------------------------------------------------------------------------
// Analysis payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date8: String,
    pub sum_a: i64,
    pub sum_b: i64,
    pub diff: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisItem {
    pub side: &'static str,
    pub day: String,
    pub sub_account_code: String,
    pub sub_account_name: String,
    pub amount_signed: i64,
    pub debit: i64,
    pub credit: i64,
    pub voucher_no: String,
    pub description: String,
    pub row_index: usize,
}

impl AnalysisItem {
    fn from_row(side: &'static str, row: &LedgerRow) -> Self {
        Self {
            side,
            day: row.posting_date.map(date8).unwrap_or_default(),
            sub_account_code: row.sub_ledger_code.clone(),
            sub_account_name: row.sub_ledger_name.clone(),
            amount_signed: row.amount_signed(),
            debit: row.debit_amount,
            credit: row.credit_amount,
            voucher_no: row.voucher_no.clone(),
            description: row.description.clone(),
            row_index: row.row_index,
        }
    }
}

/// Compact input for a downstream explanation consumer.
///
/// Field names and bounds are a compatibility contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub period: Period,
    pub branch_a: String,
    pub branch_b: String,
    pub day_summary: Vec<DaySummary>,
    pub items_a: Vec<AnalysisItem>,
    pub items_b: Vec<AnalysisItem>,
}

pub fn analysis_payload(
    period: Period,
    branch_a: &str,
    branch_b: &str,
    days: &DayTable,
    unmatched: &UnmatchedRows,
    limits: &AnalysisConfig,
) -> AnalysisPayload {
    let day_summary = days
        .rows
        .iter()
        .filter(|r| r.disagrees())
        .take(limits.max_days)
        .map(|r| DaySummary {
            date8: date8(r.date),
            sum_a: r.sum_a,
            sum_b: r.sum_b,
            diff: r.diff,
        })
        .collect();

    let sample = |side: &'static str, rows: &[LedgerRow]| {
        rows.iter()
            .take(limits.max_items)
            .map(|r| AnalysisItem::from_row(side, r))
            .collect::<Vec<_>>()
    };

    AnalysisPayload {
        period,
        branch_a: branch_a.to_string(),
        branch_b: branch_b.to_string(),
        day_summary,
        items_a: sample("A", &unmatched.a),
        items_b: sample("B", &unmatched.b),
    }
}

// ---------------------------------------------------------------------------
// Ledger report
// ---------------------------------------------------------------------------

/// Which pair a ledger run reconciled.
///
/// Output file names and the info block carry the branch codes as the
/// operator typed them (trimmed); `branch_a`/`branch_b` are their canonical
/// forms, which is what the day table and analysis payload describe.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub period: Period,
    pub input_branch_a: String,
    pub input_branch_b: String,
    pub branch_a: String,
    pub branch_a_name: String,
    pub branch_b: String,
    pub branch_b_name: String,
}

impl RunInfo {
    pub fn new(
        table: &BranchTable,
        period: Period,
        (input_a, input_b): (&str, &str),
        (branch_a, branch_b): (&str, &str),
    ) -> Self {
        Self {
            period,
            input_branch_a: input_a.trim().to_string(),
            input_branch_b: input_b.trim().to_string(),
            branch_a: branch_a.to_string(),
            branch_a_name: table.display_name(branch_a),
            branch_b: branch_b.to_string(),
            branch_b_name: table.display_name(branch_b),
        }
    }

    fn stem(&self, kind: &str) -> String {
        format!(
            "ledger-{kind}_{}_{}-{}",
            self.period, self.input_branch_a, self.input_branch_b
        )
    }

    pub fn day_table_stem(&self) -> String {
        self.stem("match")
    }

    pub fn unmatched_stem(&self) -> String {
        self.stem("unmatch")
    }

    pub fn info_stem(&self) -> String {
        self.stem("info")
    }

    pub fn analysis_stem(&self) -> String {
        self.stem("analysis")
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        vec![
            vec!["period".into(), self.period.to_string()],
            vec!["branchA".into(), self.branch_a_name.clone(), self.input_branch_a.clone()],
            vec!["branchB".into(), self.branch_b_name.clone(), self.input_branch_b.clone()],
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCounts {
    pub diff_days: usize,
    pub unmatch_count_a: usize,
    pub unmatch_count_b: usize,
    pub has_unmatch: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerReport {
    pub meta: ReportMeta,
    pub info: RunInfo,
    pub counts: LedgerCounts,
    pub skipped_a: SkipCounts,
    pub skipped_b: SkipCounts,
    pub days: DayTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched: Option<UnmatchedListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisPayload>,
}

impl LedgerReport {
    pub fn reconciled(&self) -> bool {
        self.counts.diff_days == 0
    }
}
