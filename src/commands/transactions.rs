// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use crate::cache::SnapshotCache;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(cache: &SnapshotCache, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(cache, sub);
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Category", "Amount", "Id"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: String,
}

pub fn query_rows(cache: &SnapshotCache, sub: &clap::ArgMatches) -> Vec<TransactionRow> {
    let snapshot = cache.read().unwrap_or_default();
    let kind = sub.get_one::<String>("type");
    let limit = sub.get_one::<usize>("limit").copied().unwrap_or(usize::MAX);
    snapshot
        .newest_first()
        .filter(|t| kind.is_none_or(|k| t.kind.as_str() == k.as_str()))
        .take(limit)
        .map(|t| TransactionRow {
            id: t.id.clone(),
            date: t.date.clone(),
            kind: t.kind.to_string(),
            category: t.category.clone(),
            amount: fmt_money(&t.amount),
        })
        .collect()
}
