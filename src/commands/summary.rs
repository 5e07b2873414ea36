// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use crate::analytics::{derive, DerivedAnalytics, SeriesWindow};
use crate::cache::SnapshotCache;
use crate::models::Transaction;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub records: usize,
    pub income: String,
    pub expenses: String,
    pub savings: String,
    pub balance: String,
    pub peak_expense: Option<ExpenseView>,
    pub lowest_expense: Option<ExpenseView>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseView {
    pub category: String,
    pub amount: String,
    pub date: String,
}

impl ExpenseView {
    fn from_tx(tx: &Transaction) -> Self {
        Self {
            category: tx.category.clone(),
            amount: fmt_money(&tx.amount),
            date: tx.date.clone(),
        }
    }
}

pub fn summary_view(records: usize, d: &DerivedAnalytics) -> SummaryView {
    SummaryView {
        records,
        income: fmt_money(&d.totals.income),
        expenses: fmt_money(&d.totals.expenses),
        savings: fmt_money(&d.totals.savings),
        balance: fmt_money(&d.balance),
        peak_expense: d.peak_expense.as_ref().map(ExpenseView::from_tx),
        lowest_expense: d.lowest_expense.as_ref().map(ExpenseView::from_tx),
    }
}

pub fn handle(cache: &SnapshotCache, window: SeriesWindow, sub: &clap::ArgMatches) -> Result<()> {
    let snapshot = cache.read().unwrap_or_default();
    let view = summary_view(snapshot.len(), &derive(&snapshot, window));
    if maybe_print_json(sub.get_flag("json"), &view)? {
        return Ok(());
    }

    let extreme = |e: &Option<ExpenseView>| {
        e.as_ref()
            .map(|e| format!("{} ({}, {})", e.amount, e.category, e.date))
            .unwrap_or_else(|| "-".to_string())
    };
    let rows = vec![
        vec!["Balance".to_string(), view.balance.clone()],
        vec!["Income".to_string(), view.income.clone()],
        vec!["Expenses".to_string(), view.expenses.clone()],
        vec!["Savings".to_string(), view.savings.clone()],
        vec!["Peak expense".to_string(), extreme(&view.peak_expense)],
        vec!["Lowest expense".to_string(), extreme(&view.lowest_expense)],
        vec!["Transactions".to_string(), view.records.to_string()],
    ];
    println!("{}", pretty_table(&["Figure", "Value"], rows));
    Ok(())
}
