use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One general-ledger entry, as decoded from a branch's export.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// 1-based row number in the source export (header is row 1).
    pub row_index: usize,
    pub branch_code: String,
    pub account_code: String,
    pub sub_ledger_code: String,
    pub sub_ledger_name: String,
    pub posting_date: Option<NaiveDate>,
    /// Debit including its tax amount.
    pub debit_amount: i64,
    /// Credit including its tax amount.
    pub credit_amount: i64,
    pub voucher_no: String,
    pub description: String,
    /// Every source cell, in header order.
    pub cells: Vec<String>,
}

impl LedgerRow {
    /// Debit minus credit. The loader rejects rows where this leaves the
    /// `i64` range; hand-built rows saturate.
    pub fn amount_signed(&self) -> i64 {
        self.debit_amount.saturating_sub(self.credit_amount)
    }
}

/// Sum of amounts, `None` once it leaves the `i64` range.
pub fn checked_sum(amounts: impl IntoIterator<Item = i64>) -> Option<i64> {
    amounts.into_iter().try_fold(0i64, i64::checked_add)
}

/// A decoded ledger export: the header row plus its entries.
#[derive(Debug, Clone, Default)]
pub struct LedgerSheet {
    pub headers: Vec<String>,
    pub rows: Vec<LedgerRow>,
}

/// One account-balance row of a period's trial balance.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialBalanceRow {
    pub branch_code: String,
    pub account_code: String,
    pub sub_ledger_code: String,
    pub sub_ledger_name: String,
    pub ending_balance: i64,
}

// ---------------------------------------------------------------------------
// Skip accounting
// ---------------------------------------------------------------------------

/// Rows left out of the aggregates, by reason. Skips are never errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// Booked to an account other than the clearing account.
    pub off_account: usize,
    /// Trial balance row with no owning branch code.
    pub blank_branch: usize,
    /// Ledger row owned by a branch other than the side being aggregated.
    pub other_branch: usize,
    /// Posting date missing or not normalizable.
    pub undated: usize,
    pub out_of_period: usize,
    /// Counterparty could not be determined from sub-ledger code or name.
    pub unresolved: usize,
    /// Counterparty canonicalizes to the owning branch.
    pub self_referencing: usize,
    /// Ledger row pointing at a branch other than the one reconciled against.
    pub other_counterparty: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.off_account
            + self.blank_branch
            + self.other_branch
            + self.undated
            + self.out_of_period
            + self.unresolved
            + self.self_referencing
            + self.other_counterparty
    }
}

impl AddAssign for SkipCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.off_account += rhs.off_account;
        self.blank_branch += rhs.blank_branch;
        self.other_branch += rhs.other_branch;
        self.undated += rhs.undated;
        self.out_of_period += rhs.out_of_period;
        self.unresolved += rhs.unresolved;
        self.self_referencing += rhs.self_referencing;
        self.other_counterparty += rhs.other_counterparty;
    }
}

// ---------------------------------------------------------------------------
// Trial balance
// ---------------------------------------------------------------------------

/// Balances for one unordered branch pair.
///
/// `diff` is a sum: correctly booked sides carry opposite signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairResult {
    pub left_branch: String,
    pub right_branch: String,
    pub left_amount: i64,
    pub right_amount: i64,
    pub diff: i64,
}

impl PairResult {
    pub fn agrees(&self) -> bool {
        self.diff == 0
    }
}

#[derive(Debug, Clone)]
pub struct TrialBalanceOutcome {
    pub pairs: Vec<PairResult>,
    pub skipped: SkipCounts,
}

// ---------------------------------------------------------------------------
// Ledger days
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub amount_signed: i64,
    pub sub_ledger_code: String,
}

/// One side's clearing entries against one counterparty, keyed by posting day.
#[derive(Debug, Clone, Default)]
pub struct DayBucket {
    pub summary: BTreeMap<NaiveDate, Vec<DayEntry>>,
    pub rows: BTreeMap<NaiveDate, Vec<LedgerRow>>,
    pub skipped: SkipCounts,
}

impl DayBucket {
    pub fn day_total(&self, day: NaiveDate) -> Result<i64, ReconError> {
        let Some(entries) = self.summary.get(&day) else {
            return Ok(0);
        };
        checked_sum(entries.iter().map(|e| e.amount_signed))
            .ok_or_else(|| ReconError::AmountOverflow(format!("{day} total")))
    }

    /// Sum for one sub-ledger code on one day; `None` when no entry used it.
    pub fn day_sub_total(
        &self,
        day: NaiveDate,
        sub_ledger_code: &str,
    ) -> Result<Option<i64>, ReconError> {
        let Some(entries) = self.summary.get(&day) else {
            return Ok(None);
        };
        let mut matching = entries
            .iter()
            .filter(|e| e.sub_ledger_code == sub_ledger_code)
            .map(|e| e.amount_signed)
            .peekable();
        if matching.peek().is_none() {
            return Ok(None);
        }
        checked_sum(matching).map(Some).ok_or_else(|| {
            ReconError::AmountOverflow(format!("{day} sub-ledger {sub_ledger_code} total"))
        })
    }

    pub fn entry_count(&self) -> usize {
        self.summary.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRow {
    pub date: NaiveDate,
    pub breakdown_a: Vec<Option<i64>>,
    pub breakdown_b: Vec<Option<i64>>,
    pub sum_a: i64,
    pub sum_b: i64,
    pub diff: i64,
}

impl DayRow {
    pub fn disagrees(&self) -> bool {
        self.diff != 0
    }
}

/// Every calendar day of the period with per-side totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayTable {
    /// Sub-ledger codes broken out for side A, ascending.
    pub columns_a: Vec<String>,
    /// Sub-ledger codes broken out for side B, ascending.
    pub columns_b: Vec<String>,
    pub rows: Vec<DayRow>,
}

impl DayTable {
    pub fn disagreeing_days(&self) -> Vec<NaiveDate> {
        self.rows.iter().filter(|r| r.disagrees()).map(|r| r.date).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnmatchedRows {
    pub a: Vec<LedgerRow>,
    pub b: Vec<LedgerRow>,
}

impl UnmatchedRows {
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }
}
