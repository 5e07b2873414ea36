// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use spendtrace::commands::{exporter, series, summary, transactions};
use spendtrace::{
    cli, derive, MemoryBlobStore, SeriesWindow, Snapshot, SnapshotCache, SqliteBlobStore,
    Transaction, TxKind,
};
use tempfile::tempdir;

fn tx(id: &str, kind: TxKind, category: &str, amount: i64, date: &str) -> Transaction {
    Transaction {
        id: id.into(),
        kind,
        category: category.into(),
        amount: Decimal::from(amount),
        date: date.into(),
        created_at: None,
    }
}

fn seeded_cache() -> SnapshotCache {
    let cache = SnapshotCache::new(MemoryBlobStore::new(), "cli");
    cache.write(&Snapshot::from_records(vec![
        tx("a", TxKind::Income, "Salary", 3000, "2025-03-01"),
        tx("b", TxKind::Expense, "Rent", 1200, "2025-03-02"),
        tx("c", TxKind::Expense, "Coffee, beans", 15, "2025-03-09"),
        tx("d", TxKind::Savings, "Pot", 200, "2025-03-20"),
    ]));
    cache
}

#[test]
fn list_is_newest_first_with_limit() {
    let cache = seeded_cache();
    let m = cli::build_cli().get_matches_from(["spendtrace", "list", "--limit", "2"]);
    let (_, sub) = m.subcommand().unwrap();
    let rows = transactions::query_rows(&cache, sub);
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["d", "c"]);
}

#[test]
fn list_filters_by_type() {
    let cache = seeded_cache();
    let m = cli::build_cli().get_matches_from(["spendtrace", "list", "--type", "expense"]);
    let (_, sub) = m.subcommand().unwrap();
    let rows = transactions::query_rows(&cache, sub);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.kind == "expense"));
    assert_eq!(rows[1].amount, "1200.00");
}

#[test]
fn list_rejects_unknown_type() {
    let res = cli::build_cli().try_get_matches_from(["spendtrace", "list", "--type", "loan"]);
    assert!(res.is_err());
}

#[test]
fn list_on_empty_cache_is_empty() {
    let cache = SnapshotCache::new(MemoryBlobStore::new(), "cli");
    let m = cli::build_cli().get_matches_from(["spendtrace", "list"]);
    let (_, sub) = m.subcommand().unwrap();
    assert!(transactions::query_rows(&cache, sub).is_empty());
}

#[test]
fn export_csv_quotes_and_counts() {
    let cache = seeded_cache();
    let dir = tempdir().unwrap();
    let out = dir.path().join("tx.csv");
    let n = exporter::export_transactions(&cache, "csv", out.to_str().unwrap()).unwrap();
    assert_eq!(n, 4);

    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,date,type,category,amount"));
    assert_eq!(lines.next(), Some("a,2025-03-01,income,Salary,3000"));
    assert!(text.contains("\"Coffee, beans\""));
}

#[test]
fn export_json_keeps_store_order() {
    let cache = seeded_cache();
    let dir = tempdir().unwrap();
    let out = dir.path().join("tx.json");
    exporter::export_transactions(&cache, "json", out.to_str().unwrap()).unwrap();

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let items = v.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["id"], "a");
    assert_eq!(items[1]["type"], "expense");
    assert_eq!(items[1]["amount"], "1200");
}

#[test]
fn export_unknown_format_fails() {
    let cache = seeded_cache();
    let dir = tempdir().unwrap();
    let out = dir.path().join("tx.xml");
    assert!(exporter::export_transactions(&cache, "xml", out.to_str().unwrap()).is_err());
}

#[test]
fn series_rows_are_cumulative_and_labelled() {
    let cache = seeded_cache();
    let rows = series::series_rows(&cache, SeriesWindow::default());
    assert_eq!(rows.len(), 30);
    assert_eq!(rows[0].day, "01");
    assert_eq!(rows[0].income, "3000.00");
    assert_eq!(rows[0].expenses, "0.00");
    assert_eq!(rows[1].expenses, "1200.00");
    assert_eq!(rows[29].expenses, "1215.00");
    assert_eq!(rows[18].savings, "0.00");
    assert_eq!(rows[19].savings, "200.00");
}

#[test]
fn summary_view_formats_figures() {
    let cache = seeded_cache();
    let snapshot = cache.read().unwrap();
    let view = summary::summary_view(snapshot.len(), &derive(&snapshot, SeriesWindow::default()));
    assert_eq!(view.records, 4);
    assert_eq!(view.balance, "1585.00");
    assert_eq!(view.peak_expense.as_ref().unwrap().category, "Rent");
    assert_eq!(view.lowest_expense.as_ref().unwrap().amount, "15.00");
}

#[test]
fn sqlite_cache_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.sqlite");
    let snapshot = Snapshot::from_records(vec![tx("a", TxKind::Income, "Gift", 5, "2025-01-01")]);
    {
        let cache = SnapshotCache::new(SqliteBlobStore::open(&path).unwrap(), "default");
        cache.write(&snapshot);
    }
    let cache = SnapshotCache::new(SqliteBlobStore::open(&path).unwrap(), "default");
    assert_eq!(cache.read(), Some(snapshot));
    cache.clear();
    assert!(cache.read().is_none());
}
