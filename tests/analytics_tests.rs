// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::json;
use spendtrace::{derive, SeriesWindow, Snapshot, Transaction, TxKind};

fn tx(id: &str, kind: TxKind, amount: &str, date: &str) -> Transaction {
    Transaction {
        id: id.into(),
        kind,
        category: "Misc".into(),
        amount: amount.parse().unwrap(),
        date: date.into(),
        created_at: None,
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn mixed() -> Snapshot {
    Snapshot::from_records(vec![
        tx("1", TxKind::Income, "2500.10", "2025-02-01"),
        tx("2", TxKind::Expense, "19.99", "2025-02-03T10:00:00.000Z"),
        tx("3", TxKind::Savings, "300.00", "2025-02-03"),
        tx("4", TxKind::Expense, "0.01", "2025-02-14"),
        tx("5", TxKind::Income, "0.30", "2025-03-14"),
        tx("6", TxKind::Expense, "1200.45", "2025-02-28"),
    ])
}

#[test]
fn balance_matches_totals_exactly() {
    let d = derive(&mixed(), SeriesWindow::default());
    assert_eq!(
        d.totals.income - d.totals.expenses - d.totals.savings,
        d.balance
    );
    assert_eq!(d.totals.income, dec("2500.40"));
    assert_eq!(d.totals.expenses, dec("1220.45"));
    assert_eq!(d.balance, dec("979.95"));
}

#[test]
fn empty_snapshot_derives_zeroes() {
    let d = derive(&Snapshot::empty(), SeriesWindow::default());
    assert_eq!(d.totals.income, Decimal::ZERO);
    assert_eq!(d.totals.expenses, Decimal::ZERO);
    assert_eq!(d.totals.savings, Decimal::ZERO);
    assert_eq!(d.balance, Decimal::ZERO);
    assert!(d.peak_expense.is_none());
    assert!(d.lowest_expense.is_none());
    for kind in TxKind::ALL {
        let s = d.series.for_kind(kind);
        assert_eq!(s.len(), 30);
        assert!(s.iter().all(|v| v.is_zero()));
    }
}

#[test]
fn derive_is_idempotent() {
    let snap = mixed();
    let window = SeriesWindow::default();
    assert_eq!(derive(&snap, window), derive(&snap, window));
}

#[test]
fn series_never_decrease() {
    let d = derive(&mixed(), SeriesWindow::default());
    for kind in TxKind::ALL {
        let s = d.series.for_kind(kind);
        assert!(s.windows(2).all(|w| w[0] <= w[1]), "{kind} series decreased");
    }
}

#[test]
fn day_31_lands_in_last_slot() {
    let snap = Snapshot::from_records(vec![tx("1", TxKind::Expense, "40", "2025-01-31")]);
    let d = derive(&snap, SeriesWindow::default());
    assert_eq!(d.series.expenses[28], Decimal::ZERO);
    assert_eq!(d.series.expenses[29], dec("40"));
}

#[test]
fn single_income_fills_from_its_day() {
    let snap = Snapshot::from_records(vec![tx("1", TxKind::Income, "1000", "2025-01-05")]);
    let d = derive(&snap, SeriesWindow::default());
    assert_eq!(d.totals.income, dec("1000"));
    assert_eq!(d.balance, dec("1000"));
    assert!(d.series.income[..4].iter().all(|v| v.is_zero()));
    assert!(d.series.income[4..].iter().all(|v| *v == dec("1000")));
}

#[test]
fn expense_extremes_and_total() {
    let snap = Snapshot::from_records(vec![
        tx("a", TxKind::Expense, "200", "2025-01-02"),
        tx("b", TxKind::Expense, "50", "2025-01-10"),
    ]);
    let d = derive(&snap, SeriesWindow::default());
    assert_eq!(d.peak_expense.unwrap().amount, dec("200"));
    assert_eq!(d.lowest_expense.unwrap().amount, dec("50"));
    assert_eq!(d.totals.expenses, dec("250"));
}

#[test]
fn months_alias_into_the_same_slot() {
    let snap = Snapshot::from_records(vec![
        tx("a", TxKind::Income, "10", "2025-01-07"),
        tx("b", TxKind::Income, "5", "2025-04-07"),
    ]);
    let d = derive(&snap, SeriesWindow::default());
    assert_eq!(d.series.income[5], Decimal::ZERO);
    assert_eq!(d.series.income[6], dec("15"));
}

#[test]
fn malformed_records_are_neutral() {
    let snap = Snapshot::from_raw(vec![
        json!({"id": "1", "type": "income", "amount": "abc", "date": "2025-01-05"}),
        json!({"id": "2", "type": "expense", "amount": 30, "date": "someday"}),
        json!({"id": "3", "type": "gift", "amount": 999, "date": "2025-01-05"}),
        json!({"type": "income", "amount": 999}),
        json!({"id": "5", "type": "expense", "amount": -40, "date": "2025-01-04"}),
    ]);
    assert_eq!(snap.len(), 2);
    let d = derive(&snap, SeriesWindow::default());
    assert_eq!(d.totals.income, Decimal::ZERO);
    assert_eq!(d.totals.expenses, dec("30"));
    // unparseable date counts as day 1
    assert_eq!(d.series.expenses[0], dec("30"));
}

#[test]
fn negative_delivered_amount_cannot_bend_the_series() {
    let snap = Snapshot::from_raw(vec![
        json!({"id": "1", "type": "expense", "amount": 100, "date": "2025-01-02"}),
        json!({"id": "2", "type": "expense", "amount": -40, "date": "2025-01-05"}),
    ]);
    let d = derive(&snap, SeriesWindow::default());
    assert_eq!(d.totals.expenses, dec("100"));
    assert!(d.series.expenses.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(d.lowest_expense.unwrap().id, "1");
}
