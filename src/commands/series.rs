// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use crate::analytics::{derive, series_labels, SeriesWindow};
use crate::cache::SnapshotCache;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Debug, Serialize)]
pub struct SeriesRow {
    pub day: String,
    pub income: String,
    pub expenses: String,
    pub savings: String,
}

pub fn series_rows(cache: &SnapshotCache, window: SeriesWindow) -> Vec<SeriesRow> {
    let snapshot = cache.read().unwrap_or_default();
    let s = derive(&snapshot, window).series;
    series_labels(window)
        .into_iter()
        .enumerate()
        .map(|(i, day)| SeriesRow {
            day,
            income: fmt_money(&s.income[i]),
            expenses: fmt_money(&s.expenses[i]),
            savings: fmt_money(&s.savings[i]),
        })
        .collect()
}

pub fn handle(cache: &SnapshotCache, window: SeriesWindow, sub: &clap::ArgMatches) -> Result<()> {
    let data = series_rows(cache, window);
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.day, r.income, r.expenses, r.savings])
            .collect();
        println!(
            "{}",
            pretty_table(&["Day", "Income", "Expenses", "Savings"], rows)
        );
    }
    Ok(())
}
