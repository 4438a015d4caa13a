//! All-pairs balance differences from one period's trial balance.

use std::collections::{BTreeSet, HashMap};

use crate::context::ReconContext;
use crate::error::ReconError;
use crate::model::{PairResult, SkipCounts, TrialBalanceOutcome, TrialBalanceRow};
use crate::resolver::Resolution;

type PairKey = (String, String);

/// Sum ending balances per directed branch pair and emit one result per
/// unordered pair of the canonical universe.
pub fn reconcile(
    ctx: &ReconContext,
    rows: &[TrialBalanceRow],
    universe: &[String],
    grouping: bool,
) -> Result<TrialBalanceOutcome, ReconError> {
    let mut skipped = SkipCounts::default();
    let mut sums: HashMap<PairKey, i64> = HashMap::new();
    let mut sub_codes: HashMap<PairKey, BTreeSet<String>> = HashMap::new();

    for row in rows {
        if !ctx.is_clearing_account(&row.account_code) {
            skipped.off_account += 1;
            continue;
        }
        let owner = ctx.table.canonicalize(&row.branch_code, grouping);
        if owner.is_empty() {
            skipped.blank_branch += 1;
            continue;
        }
        let other = match ctx.resolver.classify(
            &ctx.table,
            &owner,
            &row.sub_ledger_code,
            &row.sub_ledger_name,
            grouping,
        ) {
            Resolution::Resolved(code) => code,
            Resolution::Unresolved => {
                skipped.unresolved += 1;
                continue;
            }
            Resolution::SelfReferencing => {
                skipped.self_referencing += 1;
                continue;
            }
        };

        let key = (owner, other);
        sub_codes
            .entry(key.clone())
            .or_default()
            .insert(row.sub_ledger_code.trim().to_string());
        let sum = sums
            .get(&key)
            .copied()
            .unwrap_or(0)
            .checked_add(row.ending_balance)
            .ok_or_else(|| {
                ReconError::AmountOverflow(format!("trial balance {} -> {}", key.0, key.1))
            })?;
        sums.insert(key, sum);
    }

    let codes = ctx.table.canonicalize_all(universe, grouping);

    // Check every pair before emitting anything.
    for (i, left) in codes.iter().enumerate() {
        for right in &codes[i + 1..] {
            for (l, r) in [(left, right), (right, left)] {
                let count = sub_codes
                    .get(&(l.clone(), r.clone()))
                    .map_or(0, BTreeSet::len);
                if count > ctx.max_breakdown_columns {
                    return Err(ReconError::TooManyColumns {
                        left: l.clone(),
                        right: r.clone(),
                        count,
                        limit: ctx.max_breakdown_columns,
                    });
                }
            }
        }
    }

    let outside = sums
        .keys()
        .filter(|(l, r)| !codes.contains(l) || !codes.contains(r))
        .count();
    if outside > 0 {
        log::debug!("trial balance: {outside} directed pair(s) involve branches outside the configured universe");
    }

    let mut pairs = Vec::with_capacity(codes.len() * codes.len().saturating_sub(1) / 2);
    for (i, left) in codes.iter().enumerate() {
        for right in &codes[i + 1..] {
            let left_amount = sums
                .get(&(left.clone(), right.clone()))
                .copied()
                .unwrap_or(0);
            let right_amount = sums
                .get(&(right.clone(), left.clone()))
                .copied()
                .unwrap_or(0);
            pairs.push(PairResult {
                left_branch: left.clone(),
                right_branch: right.clone(),
                left_amount,
                right_amount,
                diff: left_amount.checked_add(right_amount).ok_or_else(|| {
                    ReconError::AmountOverflow(format!("trial balance {left} / {right} difference"))
                })?,
            });
        }
    }

    if skipped.unresolved > 0 {
        log::warn!(
            "trial balance: {} clearing row(s) skipped with no resolvable counterparty",
            skipped.unresolved
        );
    }

    Ok(TrialBalanceOutcome { pairs, skipped })
}
