// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Aggregation over a [`Snapshot`]: totals, balance, expense extremes and the
//! cumulative day-of-month series that back the trend chart.
//!
//! Everything here is a pure function of its inputs. Records from different
//! months share a slot when they fall on the same day of month.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Snapshot, Totals, Transaction, TxKind};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
const MAX_WINDOW_DAYS: u32 = 31;

/// Number of day slots in each series. Days past the window fold into the last slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesWindow {
    days: u32,
}

impl SeriesWindow {
    pub fn new(days: u32) -> Self {
        Self {
            days: days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Zero-based slot for a day of month.
    pub fn slot_for(&self, day: u32) -> usize {
        (day.clamp(1, self.days) - 1) as usize
    }
}

impl Default for SeriesWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

/// Chart labels `"01"`, `"02"`, ... one per slot.
pub fn series_labels(window: SeriesWindow) -> Vec<String> {
    (1..=window.days()).map(|d| format!("{:02}", d)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub income: Vec<Decimal>,
    pub expenses: Vec<Decimal>,
    pub savings: Vec<Decimal>,
}

impl Series {
    fn zeroed(window: SeriesWindow) -> Self {
        let n = window.days() as usize;
        Self {
            income: vec![Decimal::ZERO; n],
            expenses: vec![Decimal::ZERO; n],
            savings: vec![Decimal::ZERO; n],
        }
    }

    pub fn for_kind(&self, kind: TxKind) -> &[Decimal] {
        match kind {
            TxKind::Income => &self.income,
            TxKind::Expense => &self.expenses,
            TxKind::Savings => &self.savings,
        }
    }

    fn for_kind_mut(&mut self, kind: TxKind) -> &mut Vec<Decimal> {
        match kind {
            TxKind::Income => &mut self.income,
            TxKind::Expense => &mut self.expenses,
            TxKind::Savings => &mut self.savings,
        }
    }

    fn accumulate(&mut self) {
        for kind in TxKind::ALL {
            let slots = self.for_kind_mut(kind);
            let mut running = Decimal::ZERO;
            for slot in slots.iter_mut() {
                running += *slot;
                *slot = running;
            }
        }
    }
}

/// Figures derived from one snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedAnalytics {
    pub totals: Totals,
    pub balance: Decimal,
    pub peak_expense: Option<Transaction>,
    pub lowest_expense: Option<Transaction>,
    pub series: Series,
}

/// Derives totals, expense extremes and cumulative series in one pass.
///
/// Among expenses with equal amounts the earliest in snapshot order wins, for
/// both peak and lowest. Records whose date does not parse count as day 1.
pub fn derive(snapshot: &Snapshot, window: SeriesWindow) -> DerivedAnalytics {
    let mut totals = Totals::default();
    let mut series = Series::zeroed(window);
    let mut peak: Option<&Transaction> = None;
    let mut lowest: Option<&Transaction> = None;

    for tx in snapshot {
        let amount = tx.amount;
        match tx.kind {
            TxKind::Income => totals.income += amount,
            TxKind::Expense => {
                totals.expenses += amount;
                if peak.is_none_or(|p| amount > p.amount) {
                    peak = Some(tx);
                }
                if lowest.is_none_or(|l| amount < l.amount) {
                    lowest = Some(tx);
                }
            }
            TxKind::Savings => totals.savings += amount,
        }

        let slot = window.slot_for(tx.day_of_month().unwrap_or(1));
        series.for_kind_mut(tx.kind)[slot] += amount;
    }

    series.accumulate();

    DerivedAnalytics {
        balance: totals.balance(),
        totals,
        peak_expense: peak.cloned(),
        lowest_expense: lowest.cloned(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str, kind: TxKind, amount: i64, date: &str) -> Transaction {
        Transaction {
            id: id.into(),
            kind,
            category: "c".into(),
            amount: Decimal::from(amount),
            date: date.into(),
            created_at: None,
        }
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(SeriesWindow::new(0).days(), 1);
        assert_eq!(SeriesWindow::new(90).days(), 31);
        assert_eq!(SeriesWindow::default().slot_for(31), 29);
        assert_eq!(SeriesWindow::default().slot_for(0), 0);
    }

    #[test]
    fn labels_are_zero_padded() {
        let labels = series_labels(SeriesWindow::default());
        assert_eq!(labels.len(), 30);
        assert_eq!(labels[0], "01");
        assert_eq!(labels[29], "30");
    }

    #[test]
    fn equal_expenses_pick_first_in_order() {
        let snap = Snapshot::from_records(vec![
            tx("a", TxKind::Expense, 10, "2025-01-01"),
            tx("b", TxKind::Expense, 10, "2025-01-02"),
        ]);
        let d = derive(&snap, SeriesWindow::default());
        assert_eq!(d.peak_expense.unwrap().id, "a");
        assert_eq!(d.lowest_expense.unwrap().id, "a");
    }

    #[test]
    fn unparseable_date_lands_in_first_slot() {
        let snap = Snapshot::from_records(vec![tx("a", TxKind::Savings, 7, "not a date")]);
        let d = derive(&snap, SeriesWindow::default());
        assert!(d.series.savings.iter().all(|v| *v == Decimal::from(7)));
    }

    #[test]
    fn shorter_window_folds_late_days() {
        let snap = Snapshot::from_records(vec![tx("a", TxKind::Income, 3, "2025-01-20")]);
        let d = derive(&snap, SeriesWindow::new(7));
        assert_eq!(d.series.income.len(), 7);
        assert_eq!(d.series.income[5], Decimal::ZERO);
        assert_eq!(d.series.income[6], Decimal::from(3));
    }
}
