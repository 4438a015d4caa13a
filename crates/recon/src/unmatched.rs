use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::NaiveDate;

use crate::model::{LedgerRow, UnmatchedRows};

/// Pair off A and B rows with offsetting amounts on each disagreeing day.
///
/// Greedy and amount-only: each A row consumes the earliest unconsumed B row
/// whose amount is its exact negation. Whatever is left on either side is
/// unmatched. Days are processed in the order given.
pub fn extract_unmatched(
    rows_a: &BTreeMap<NaiveDate, Vec<LedgerRow>>,
    rows_b: &BTreeMap<NaiveDate, Vec<LedgerRow>>,
    disagreeing_days: &[NaiveDate],
) -> UnmatchedRows {
    let mut out = UnmatchedRows::default();

    for day in disagreeing_days {
        let day_a = rows_a.get(day).map(Vec::as_slice).unwrap_or(&[]);
        let day_b = rows_b.get(day).map(Vec::as_slice).unwrap_or(&[]);

        let mut by_amount: HashMap<i64, VecDeque<usize>> = HashMap::new();
        for (i, b) in day_b.iter().enumerate() {
            by_amount.entry(b.amount_signed()).or_default().push_back(i);
        }

        let mut consumed = vec![false; day_b.len()];
        for a in day_a {
            // i64::MIN has no negation, so nothing can offset it.
            let candidates = match a.amount_signed().checked_neg() {
                Some(offset) => by_amount.get_mut(&offset),
                None => None,
            };
            match candidates.and_then(VecDeque::pop_front) {
                Some(bi) => consumed[bi] = true,
                None => out.a.push(a.clone()),
            }
        }

        out.b.extend(
            day_b
                .iter()
                .zip(&consumed)
                .filter(|(_, used)| !**used)
                .map(|(b, _)| b.clone()),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn row(idx: usize, amount: i64) -> LedgerRow {
        let (debit_amount, credit_amount) = if amount >= 0 { (amount, 0) } else { (0, -amount) };
        LedgerRow {
            row_index: idx,
            branch_code: String::new(),
            account_code: "11652090".into(),
            sub_ledger_code: String::new(),
            sub_ledger_name: String::new(),
            posting_date: Some(day(1)),
            debit_amount,
            credit_amount,
            voucher_no: String::new(),
            description: String::new(),
            cells: Vec::new(),
        }
    }

    fn one_day(a: &[i64], b: &[i64]) -> UnmatchedRows {
        let rows_a = BTreeMap::from([(day(1), a.iter().enumerate().map(|(i, v)| row(i, *v)).collect())]);
        let rows_b = BTreeMap::from([(day(1), b.iter().enumerate().map(|(i, v)| row(100 + i, *v)).collect())]);
        extract_unmatched(&rows_a, &rows_b, &[day(1)])
    }

    #[test]
    fn full_match_leaves_nothing() {
        let out = one_day(&[100, 50], &[-100, -50]);
        assert!(out.is_empty());
    }

    #[test]
    fn partial_match_leaves_extra_b() {
        let out = one_day(&[100], &[-100, -100]);
        assert!(out.a.is_empty());
        assert_eq!(out.b.len(), 1);
        assert_eq!(out.b[0].amount_signed(), -100);
        // The first B row was consumed, the second is left over
        assert_eq!(out.b[0].row_index, 101);
    }

    #[test]
    fn no_offset_reports_both_sides() {
        let out = one_day(&[100, 70], &[-100, -60]);
        assert_eq!(out.a.len(), 1);
        assert_eq!(out.a[0].amount_signed(), 70);
        assert_eq!(out.b.len(), 1);
        assert_eq!(out.b[0].amount_signed(), -60);
    }

    #[test]
    fn most_negative_amount_stays_unmatched() {
        let mut a = row(0, 0);
        a.debit_amount = i64::MIN;
        let rows_a = BTreeMap::from([(day(1), vec![a])]);
        let rows_b = BTreeMap::from([(day(1), vec![row(100, i64::MAX)])]);
        let out = extract_unmatched(&rows_a, &rows_b, &[day(1)]);
        assert_eq!(out.a.len(), 1);
        assert_eq!(out.b.len(), 1);
    }

    #[test]
    fn same_sign_does_not_match() {
        let out = one_day(&[100], &[100]);
        assert_eq!(out.a.len(), 1);
        assert_eq!(out.b.len(), 1);
    }

    #[test]
    fn only_disagreeing_days_are_examined() {
        let rows_a = BTreeMap::from([
            (day(1), vec![row(1, 100)]),
            (day(2), vec![row(2, 40)]),
        ]);
        let rows_b = BTreeMap::from([(day(2), vec![row(3, -10)])]);
        let out = extract_unmatched(&rows_a, &rows_b, &[day(2)]);
        assert_eq!(out.a.len(), 1);
        assert_eq!(out.a[0].row_index, 2);
        assert_eq!(out.b.len(), 1);
    }

    #[test]
    fn day_missing_on_one_side() {
        let rows_a = BTreeMap::new();
        let rows_b = BTreeMap::from([(day(4), vec![row(9, -25), row(10, 25)])]);
        let out = extract_unmatched(&rows_a, &rows_b, &[day(4)]);
        assert!(out.a.is_empty());
        let idx: Vec<_> = out.b.iter().map(|r| r.row_index).collect();
        assert_eq!(idx, vec![9, 10]);
    }

    proptest! {
        /// Each match removes one row from each side, and nothing left over
        /// on A still has an offsetting row left over on B.
        #[test]
        fn matching_conserves_counts(
            a in proptest::collection::vec(-5i64..5, 0..20),
            b in proptest::collection::vec(-5i64..5, 0..20),
        ) {
            let out = one_day(&a, &b);
            let matched_a = a.len() - out.a.len();
            let matched_b = b.len() - out.b.len();
            prop_assert_eq!(matched_a, matched_b);
            for amount in out.a.iter().map(LedgerRow::amount_signed) {
                prop_assert!(out.b.iter().all(|r| r.amount_signed() != -amount));
            }
        }
    }
}
