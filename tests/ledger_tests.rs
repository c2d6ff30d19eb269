// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use jokermarket::LedgerError;
use jokermarket::ledger::{
    self, Domain, LedgerEntry, Subtype, balance_as_of, cash_effect, compute_running_balances,
    contribution, current_balance, parse_timestamp,
};
use rust_decimal::Decimal;

fn entry(id: i64, date: &str, domain: Domain, subtype: Subtype, amount: i64) -> LedgerEntry {
    LedgerEntry {
        id,
        date: parse_timestamp(date).unwrap(),
        domain,
        subtype,
        amount: Decimal::from(amount),
        account_key: "Orange".into(),
        category: None,
        note: None,
    }
}

fn airtime_history() -> Vec<LedgerEntry> {
    vec![
        entry(1, "2025-03-01 08:00", Domain::Airtime, Subtype::Purchase, 10000),
        entry(2, "2025-03-02 10:30", Domain::Airtime, Subtype::Sale, 3000),
        entry(3, "2025-03-03 17:45", Domain::Airtime, Subtype::Adjustment, -500),
    ]
}

fn mixed_history() -> Vec<LedgerEntry> {
    vec![
        entry(1, "2025-03-01 08:00", Domain::Airtime, Subtype::Purchase, 10000),
        entry(2, "2025-03-01 08:00", Domain::Airtime, Subtype::Sale, 1500),
        entry(3, "2025-03-01 12:00", Domain::Airtime, Subtype::Commission, 250),
        entry(4, "2025-02-27 09:00", Domain::Airtime, Subtype::Sale, 700),
        entry(5, "2025-03-01 08:00", Domain::Airtime, Subtype::Adjustment, -40),
        entry(6, "2025-03-04 19:00", Domain::Airtime, Subtype::Purchase, 2000),
    ]
}

fn permutations(items: &[LedgerEntry]) -> Vec<Vec<LedgerEntry>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

#[test]
fn airtime_running_balance_matches_worked_example() {
    let rows = compute_running_balances(&airtime_history(), contribution);
    let balances: Vec<Decimal> = rows.iter().map(|r| r.balance_after).collect();
    assert_eq!(
        balances,
        vec![Decimal::from(10000), Decimal::from(7000), Decimal::from(6500)]
    );
    assert_eq!(
        current_balance(&airtime_history(), contribution),
        Decimal::from(6500)
    );
}

#[test]
fn empty_history_has_zero_balance() {
    assert!(compute_running_balances(&[], contribution).is_empty());
    assert_eq!(current_balance(&[], contribution), Decimal::ZERO);
    let cutoff = parse_timestamp("2025-01-01").unwrap();
    assert_eq!(balance_as_of(&[], contribution, cutoff), Decimal::ZERO);
}

#[test]
fn ordering_and_balance_ignore_input_permutation() {
    let base = mixed_history();
    let reference = compute_running_balances(&base, contribution);
    let ids: Vec<i64> = reference.iter().map(|r| r.entry.id).collect();
    // Same timestamp resolves by id: 1, 2, 5
    assert_eq!(ids, vec![4, 1, 2, 5, 3, 6]);

    for perm in permutations(&base) {
        let rows = compute_running_balances(&perm, contribution);
        assert_eq!(rows, reference);
    }
}

#[test]
fn each_balance_is_previous_plus_contribution() {
    let rows = compute_running_balances(&mixed_history(), contribution);
    let mut prev = Decimal::ZERO;
    for r in &rows {
        assert_eq!(r.balance_after, prev + contribution(&r.entry));
        prev = r.balance_after;
    }
}

#[test]
fn recomputing_from_own_output_is_stable() {
    let first = compute_running_balances(&mixed_history(), contribution);
    let stripped: Vec<LedgerEntry> = first.iter().map(|r| r.entry.clone()).collect();
    let second = compute_running_balances(&stripped, contribution);
    assert_eq!(first, second);
}

#[test]
fn opening_plus_later_flows_equals_current() {
    let entries = mixed_history();
    let current = current_balance(&entries, contribution);
    let cutoffs = [
        "2025-02-01 00:00",
        "2025-02-27 09:00",
        "2025-03-01 08:00",
        "2025-03-01 11:59",
        "2025-03-04 19:00",
        "2025-04-01 00:00",
    ];
    for c in cutoffs {
        let cutoff = parse_timestamp(c).unwrap();
        let later: Decimal = entries
            .iter()
            .filter(|e| e.date > cutoff)
            .map(contribution)
            .sum();
        assert_eq!(balance_as_of(&entries, contribution, cutoff) + later, current, "{}", c);
    }
}

#[test]
fn balance_as_of_includes_entries_on_the_cutoff() {
    let entries = airtime_history();
    let cutoff = parse_timestamp("2025-03-02 10:30").unwrap();
    assert_eq!(
        balance_as_of(&entries, contribution, cutoff),
        Decimal::from(7000)
    );
}

#[test]
fn sign_rules_per_ledger() {
    let d = "2025-03-01";
    let cases = [
        (Domain::Cash, Subtype::Sale, 100, 100, 100),
        (Domain::Cash, Subtype::Expense, 100, -100, -100),
        (Domain::Cash, Subtype::Purchase, 100, -100, -100),
        (Domain::Cash, Subtype::Adjustment, -30, -30, -30),
        (Domain::Airtime, Subtype::Sale, 100, -100, 100),
        (Domain::Airtime, Subtype::Purchase, 100, 100, -100),
        (Domain::Airtime, Subtype::Commission, 10, 10, 0),
        (Domain::MobileMoney, Subtype::Deposit, 100, -100, 100),
        (Domain::MobileMoney, Subtype::Withdrawal, 100, 100, -100),
        (Domain::MobileMoney, Subtype::Transfer, 100, -100, 100),
        (Domain::Inventory, Subtype::In, 12, 12, 0),
        (Domain::Inventory, Subtype::Out, 3, -3, 0),
        (Domain::Inventory, Subtype::Adjustment, -2, -2, 0),
    ];
    for (domain, subtype, amount, own, till) in cases {
        let e = entry(1, d, domain, subtype, amount);
        assert_eq!(contribution(&e), Decimal::from(own), "{} {}", domain, subtype);
        assert_eq!(cash_effect(&e), Decimal::from(till), "{} {}", domain, subtype);
    }
}

#[test]
fn validation_rejects_bad_entries() {
    assert!(ledger::validate(Domain::Cash, Subtype::Sale, Decimal::from(5)).is_ok());
    assert!(ledger::validate(Domain::Inventory, Subtype::Adjustment, Decimal::from(-5)).is_ok());

    let wrong_ledger = ledger::validate(Domain::Inventory, Subtype::Sale, Decimal::from(1));
    assert!(matches!(wrong_ledger, Err(LedgerError::InvalidEntry(_))));
    let negative_sale = ledger::validate(Domain::Cash, Subtype::Sale, Decimal::from(-1));
    assert!(matches!(negative_sale, Err(LedgerError::InvalidEntry(_))));
    let zero_adjust = ledger::validate(Domain::Cash, Subtype::Adjustment, Decimal::ZERO);
    assert!(matches!(zero_adjust, Err(LedgerError::InvalidEntry(_))));
}

#[test]
fn timestamps_parse_or_fail_fast() {
    let midnight = parse_timestamp("2025-03-01").unwrap();
    assert_eq!(ledger::format_timestamp(&midnight), "2025-03-01 00:00:00");
    let t = parse_timestamp(" 2025-03-01T14:05 ").unwrap();
    assert_eq!(ledger::format_timestamp(&t), "2025-03-01 14:05:00");

    for bad in ["", "yesterday", "2025-13-01", "01/03/2025"] {
        assert!(matches!(
            parse_timestamp(bad),
            Err(LedgerError::InvalidEntry(_))
        ));
    }
    assert!(matches!(
        ledger::parse_amount("NaN"),
        Err(LedgerError::InvalidEntry(_))
    ));
    assert!(matches!(
        ledger::parse_amount("1e400"),
        Err(LedgerError::InvalidEntry(_))
    ));
}
