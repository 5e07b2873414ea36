// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;
use serde_json::Value;

/// Parses plain (`12.50`) and scientific (`1.25e1`) notation.
fn parse_decimal_lenient(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Coerces a stored amount into a decimal.
///
/// Numbers and numeric strings are accepted; anything else (missing, null,
/// non-numeric text, out of range) yields `None`.
pub fn coerce_amount(v: Option<&Value>) -> Option<Decimal> {
    match v? {
        Value::Number(n) => parse_decimal_lenient(&n.to_string()).or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| Decimal::try_from(f).ok())
        }),
        Value::String(s) => parse_decimal_lenient(s),
        _ => None,
    }
}

/// Renders a decimal as a JSON number, the shape the document store keeps amounts in.
pub fn decimal_to_json(d: Decimal) -> Value {
    serde_json::from_str(&d.normalize().to_string()).unwrap_or(Value::Null)
}

/// Day of month of an ISO-8601 timestamp or plain `YYYY-MM-DD` date.
///
/// Offsets are honored: the day is the one written in the timestamp's own offset.
pub fn day_of_month(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.day());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.day());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.day());
    }
    None
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}
