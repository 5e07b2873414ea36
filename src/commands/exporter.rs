// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use serde_json::json;

use crate::cache::SnapshotCache;

pub fn handle(cache: &SnapshotCache, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    let out = sub
        .get_one::<String>("out")
        .context("--out is required")?;
    let count = export_transactions(cache, &fmt, out)?;
    println!("Exported {} transactions to {}", count, out);
    Ok(())
}

/// Writes the cached snapshot in store order. Returns the number of rows written.
pub fn export_transactions(cache: &SnapshotCache, fmt: &str, out: &str) -> Result<usize> {
    let snapshot = cache.read().unwrap_or_default();
    match fmt {
        "csv" => {
            let mut wtr =
                csv::Writer::from_path(out).with_context(|| format!("open {}", out))?;
            wtr.write_record(["id", "date", "type", "category", "amount"])?;
            for t in &snapshot {
                wtr.write_record([
                    t.id.as_str(),
                    t.date.as_str(),
                    t.kind.as_str(),
                    t.category.as_str(),
                    t.amount.to_string().as_str(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = snapshot
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id, "date": t.date, "type": t.kind.as_str(),
                        "category": t.category, "amount": t.amount.to_string()
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("write {}", out))?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(snapshot.len())
}
