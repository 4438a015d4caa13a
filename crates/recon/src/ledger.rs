//! Day-level aggregation of two branches' ledgers against each other.
//!
//! Each side is aggregated on its own: branch A's ledger looking at B, and
//! branch B's ledger looking at A. The day table lines the two up.

use std::collections::BTreeSet;

use crate::context::ReconContext;
use crate::error::ReconError;
use crate::model::{DayBucket, DayEntry, DayRow, DayTable, LedgerRow};
use crate::period::Period;
use crate::resolver::Resolution;

/// Bucket one side's clearing entries against `counter_branch` by posting day.
pub fn aggregate(
    ctx: &ReconContext,
    rows: &[LedgerRow],
    self_branch: &str,
    counter_branch: &str,
    period: Period,
    grouping: bool,
) -> DayBucket {
    let own = ctx.table.canonicalize(self_branch, grouping);
    let counter = ctx.table.canonicalize(counter_branch, grouping);
    let mut bucket = DayBucket::default();

    for row in rows {
        if !ctx.is_clearing_account(&row.account_code) {
            bucket.skipped.off_account += 1;
            continue;
        }
        if ctx.table.canonicalize(&row.branch_code, grouping) != own {
            bucket.skipped.other_branch += 1;
            continue;
        }
        let Some(day) = row.posting_date else {
            bucket.skipped.undated += 1;
            continue;
        };
        if !period.contains(day) {
            bucket.skipped.out_of_period += 1;
            continue;
        }
        match ctx.resolver.classify(
            &ctx.table,
            &own,
            &row.sub_ledger_code,
            &row.sub_ledger_name,
            grouping,
        ) {
            Resolution::Resolved(code) if code == counter => {}
            Resolution::Resolved(_) => {
                bucket.skipped.other_counterparty += 1;
                continue;
            }
            Resolution::Unresolved => {
                bucket.skipped.unresolved += 1;
                continue;
            }
            Resolution::SelfReferencing => {
                bucket.skipped.self_referencing += 1;
                continue;
            }
        }

        bucket.summary.entry(day).or_default().push(DayEntry {
            amount_signed: row.amount_signed(),
            sub_ledger_code: row.sub_ledger_code.trim().to_string(),
        });
        bucket.rows.entry(day).or_default().push(row.clone());
    }

    log::debug!(
        "ledger {own} -> {counter}: {} entries on {} day(s), {} skipped",
        bucket.entry_count(),
        bucket.summary.len(),
        bucket.skipped.total()
    );
    if bucket.skipped.unresolved > 0 {
        log::warn!(
            "ledger {own}: {} clearing row(s) skipped with no resolvable counterparty",
            bucket.skipped.unresolved
        );
    }

    bucket
}

/// Configured sub-ledger codes that book against `counter_branch`, ascending.
pub fn breakdown_columns(ctx: &ReconContext, counter_branch: &str, grouping: bool) -> Vec<String> {
    let counter = ctx.table.canonicalize(counter_branch, grouping);
    ctx.sub_ledger_branches
        .iter()
        .filter(|(_, branch)| ctx.table.canonicalize(branch, grouping) == counter)
        .map(|(code, _)| code.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Line up both sides for every day of the period.
///
/// Fails before building anything when either side would need more breakdown
/// columns than the configured limit.
pub fn build_day_table(
    ctx: &ReconContext,
    period: Period,
    branch_a: &str,
    branch_b: &str,
    side_a: &DayBucket,
    side_b: &DayBucket,
    grouping: bool,
) -> Result<DayTable, ReconError> {
    let columns_a = breakdown_columns(ctx, branch_b, grouping);
    let columns_b = breakdown_columns(ctx, branch_a, grouping);

    let widest = columns_a.len().max(columns_b.len());
    if widest > ctx.max_breakdown_columns {
        return Err(ReconError::TooManyColumns {
            left: ctx.table.canonicalize(branch_a, grouping),
            right: ctx.table.canonicalize(branch_b, grouping),
            count: widest,
            limit: ctx.max_breakdown_columns,
        });
    }

    let rows = period
        .days()
        .into_iter()
        .map(|date| -> Result<DayRow, ReconError> {
            let sum_a = side_a.day_total(date)?;
            let sum_b = side_b.day_total(date)?;
            Ok(DayRow {
                date,
                breakdown_a: columns_a
                    .iter()
                    .map(|c| side_a.day_sub_total(date, c))
                    .collect::<Result<Vec<_>, _>>()?,
                breakdown_b: columns_b
                    .iter()
                    .map(|c| side_b.day_sub_total(date, c))
                    .collect::<Result<Vec<_>, _>>()?,
                sum_a,
                sum_b,
                diff: sum_a
                    .checked_add(sum_b)
                    .ok_or_else(|| ReconError::AmountOverflow(format!("{date} difference")))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DayTable {
        columns_a,
        columns_b,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use chrono::NaiveDate;

    const CONFIG: &str = r#"
name = "test"
clearing_account = "11652090"

[[branches]]
code = "A"
name = "Branch A"

[[branches]]
code = "B"
name = "Branch B"

[[branches]]
code = "C"
name = "Branch C"

[[sub_ledgers]]
code = "0001"
branch = "A"

[[sub_ledgers]]
code = "0006"
branch = "B"

[[sub_ledgers]]
code = "0007"
branch = "B"

[[sub_ledgers]]
code = "0011"
branch = "C"
"#;

    fn ctx() -> ReconContext {
        ReconContext::from_config(&ReconConfig::from_toml(CONFIG).unwrap())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn row(branch: &str, sub: &str, d: Option<NaiveDate>, debit: i64, credit: i64) -> LedgerRow {
        LedgerRow {
            row_index: 2,
            branch_code: branch.into(),
            account_code: "11652090".into(),
            sub_ledger_code: sub.into(),
            sub_ledger_name: String::new(),
            posting_date: d,
            debit_amount: debit,
            credit_amount: credit,
            voucher_no: String::new(),
            description: String::new(),
            cells: Vec::new(),
        }
    }

    fn period() -> Period {
        Period::parse("2025-03").unwrap()
    }

    #[test]
    fn buckets_by_day() {
        let ctx = ctx();
        let rows = vec![
            row("A", "0006", Some(day(3)), 100, 0),
            row("A", "0007", Some(day(3)), 0, 30),
            row("A", "0006", Some(day(5)), 50, 0),
        ];
        let bucket = aggregate(&ctx, &rows, "A", "B", period(), false);
        assert_eq!(bucket.summary.len(), 2);
        assert_eq!(bucket.day_total(day(3)).unwrap(), 70);
        assert_eq!(bucket.day_total(day(5)).unwrap(), 50);
        assert_eq!(bucket.day_total(day(4)).unwrap(), 0);
        assert_eq!(bucket.rows[&day(3)].len(), 2);
        assert_eq!(bucket.day_sub_total(day(3), "0007").unwrap(), Some(-30));
        assert_eq!(bucket.day_sub_total(day(5), "0007").unwrap(), None);
    }

    #[test]
    fn filters_are_counted_by_reason() {
        let ctx = ctx();
        let mut off = row("A", "0006", Some(day(1)), 1, 0);
        off.account_code = "99999999".into();
        let rows = vec![
            off,
            row("B", "0006", Some(day(1)), 1, 0),
            row("A", "0006", None, 1, 0),
            row("A", "0006", Some(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()), 1, 0),
            row("A", "9999", Some(day(1)), 1, 0),
            row("A", "0001", Some(day(1)), 1, 0),
            row("A", "0011", Some(day(1)), 1, 0),
            row("A", "0006", Some(day(1)), 1, 0),
        ];
        let bucket = aggregate(&ctx, &rows, "A", "B", period(), false);
        let s = bucket.skipped;
        assert_eq!(s.off_account, 1);
        assert_eq!(s.other_branch, 1);
        assert_eq!(s.undated, 1);
        assert_eq!(s.out_of_period, 1);
        assert_eq!(s.unresolved, 1);
        assert_eq!(s.self_referencing, 1);
        assert_eq!(s.other_counterparty, 1);
        assert_eq!(bucket.entry_count(), 1);
    }

    #[test]
    fn columns_belong_to_counterparty() {
        let ctx = ctx();
        assert_eq!(breakdown_columns(&ctx, "B", false), vec!["0006", "0007"]);
        assert_eq!(breakdown_columns(&ctx, "A", false), vec!["0001"]);
        assert!(breakdown_columns(&ctx, "Q", false).is_empty());
    }

    #[test]
    fn day_table_covers_every_day() {
        let ctx = ctx();
        let a = aggregate(
            &ctx,
            &[row("A", "0006", Some(day(3)), 100, 0)],
            "A",
            "B",
            period(),
            false,
        );
        let b = aggregate(
            &ctx,
            &[row("B", "0001", Some(day(3)), 0, 80)],
            "B",
            "A",
            period(),
            false,
        );
        let table = build_day_table(&ctx, period(), "A", "B", &a, &b, false).unwrap();
        assert_eq!(table.rows.len(), 31);
        assert_eq!(table.columns_a, vec!["0006", "0007"]);
        assert_eq!(table.columns_b, vec!["0001"]);

        let d3 = &table.rows[2];
        assert_eq!(d3.date, day(3));
        assert_eq!(d3.breakdown_a, vec![Some(100), None]);
        assert_eq!(d3.breakdown_b, vec![Some(-80)]);
        assert_eq!((d3.sum_a, d3.sum_b, d3.diff), (100, -80, 20));
        assert_eq!(table.disagreeing_days(), vec![day(3)]);

        let d4 = &table.rows[3];
        assert_eq!(d4.breakdown_a, vec![None, None]);
        assert_eq!(d4.diff, 0);
    }

    #[test]
    fn column_guard() {
        let mut input = CONFIG.replacen(
            "clearing_account = \"11652090\"\n",
            "clearing_account = \"11652090\"\nmax_breakdown_columns = 1\n",
            1,
        );
        input.push('\n');
        let ctx = ReconContext::from_config(&ReconConfig::from_toml(&input).unwrap());
        let empty = DayBucket::default();
        let err = build_day_table(&ctx, period(), "A", "B", &empty, &empty, false).unwrap_err();
        assert!(matches!(err, ReconError::TooManyColumns { count: 2, limit: 1, .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn day_sum_overflow_is_an_error() {
        let ctx = ctx();
        let rows = vec![
            row("A", "0006", Some(day(3)), i64::MAX, 0),
            row("A", "0006", Some(day(3)), 1, 0),
        ];
        let a = aggregate(&ctx, &rows, "A", "B", period(), false);
        assert!(matches!(a.day_total(day(3)), Err(ReconError::AmountOverflow(_))));
        assert!(a.day_sub_total(day(3), "0006").is_err());

        let empty = DayBucket::default();
        let err = build_day_table(&ctx, period(), "A", "B", &a, &empty, false).unwrap_err();
        assert_eq!(err.to_string(), "2025-03-03 total: amount overflow");
    }

    #[test]
    fn day_difference_overflow_is_an_error() {
        let ctx = ctx();
        let a = aggregate(
            &ctx,
            &[row("A", "0006", Some(day(3)), i64::MAX, 0)],
            "A",
            "B",
            period(),
            false,
        );
        let b = aggregate(
            &ctx,
            &[row("B", "0001", Some(day(3)), 1, 0)],
            "B",
            "A",
            period(),
            false,
        );
        let err = build_day_table(&ctx, period(), "A", "B", &a, &b, false).unwrap_err();
        assert!(err.to_string().contains("2025-03-03 difference"));
    }
}
