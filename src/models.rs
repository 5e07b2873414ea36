// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::SyncError;
use crate::utils::{coerce_amount, day_of_month};

/// Store-assigned record identifier.
pub type TxId = String;

/// Label used for records whose stored category is missing or blank.
pub const UNCATEGORIZED: &str = "(uncategorized)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
    Savings,
}

impl TxKind {
    pub const ALL: [TxKind; 3] = [TxKind::Income, TxKind::Expense, TxKind::Savings];

    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
            TxKind::Savings => "savings",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            "savings" => Ok(TxKind::Savings),
            other => Err(SyncError::validation(format!(
                "unknown transaction type '{}', expected income|expense|savings",
                other
            ))),
        }
    }
}

/// A transaction as mirrored from the authoritative store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub category: String,
    pub amount: Decimal,
    /// Event timestamp exactly as stored (ISO-8601 expected, not guaranteed).
    pub date: String,
    /// Server ordering token; never shown to the user.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Transaction {
    /// Parses one record delivered by the store into the closed transaction shape.
    ///
    /// Returns `None` for records that cannot be identified or typed, and for
    /// negative amounts. Amounts that are missing or not numeric become zero; a
    /// blank category becomes [`UNCATEGORIZED`]; the date is kept verbatim.
    pub fn from_raw(raw: &Value) -> Option<Transaction> {
        let obj = raw.as_object()?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<TxKind>().ok())?;
        let category = obj
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNCATEGORIZED);
        let amount = coerce_amount(obj.get("amount")).unwrap_or(Decimal::ZERO);
        if amount < Decimal::ZERO {
            return None;
        }
        let date = obj
            .get("date")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let created_at = obj.get("createdAt").and_then(Value::as_i64);

        Some(Transaction {
            id: id.to_string(),
            kind,
            category: category.to_string(),
            amount,
            date: date.to_string(),
            created_at,
        })
    }

    /// Day of month of `date`, if it parses.
    pub fn day_of_month(&self) -> Option<u32> {
        day_of_month(&self.date)
    }
}

/// The complete, replace-not-patch view of one identity's transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<Transaction>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps already-validated records, keeping the store's order.
    pub fn from_records(records: Vec<Transaction>) -> Self {
        Self { records }
    }

    /// Parse boundary for store deliveries. Unusable records are dropped.
    pub fn from_raw(raw: Vec<Value>) -> Self {
        let total = raw.len();
        let records: Vec<Transaction> = raw
            .iter()
            .filter_map(|r| {
                let parsed = Transaction::from_raw(r);
                if parsed.is_none() {
                    warn!(record = %r, "dropping malformed transaction record");
                }
                parsed
            })
            .collect();
        if records.len() != total {
            warn!(kept = records.len(), total, "snapshot contained malformed records");
        }
        Self { records }
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.records.iter()
    }

    /// Records in reverse delivery order, newest event first.
    pub fn newest_first(&self) -> impl Iterator<Item = &Transaction> {
        self.records.iter().rev()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.records.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Unvalidated, caller-supplied proposal for a new transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Draft {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub date: Option<String>,
}

impl Draft {
    pub fn new(kind: impl Into<String>, category: impl Into<String>, amount: f64) -> Self {
        Self {
            kind: kind.into(),
            category: category.into(),
            amount,
            date: None,
        }
    }

    pub fn dated(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Checks the transaction invariants; `now` stamps drafts without a date.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTransaction, SyncError> {
        let kind = self.kind.parse::<TxKind>()?;
        let category = validate_category(&self.category)?;
        let amount = validate_amount_f64(self.amount)?;
        let date = match self.date {
            Some(d) if !d.trim().is_empty() => d.trim().to_string(),
            _ => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        Ok(NewTransaction {
            kind,
            category,
            amount,
            date,
        })
    }
}

/// A draft that passed validation, ready to submit to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TxKind,
    pub category: String,
    pub amount: Decimal,
    pub date: String,
}

/// Caller-supplied partial edit. `amount` may arrive as a number or numeric text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchInput {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
}

impl PatchInput {
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn amount(mut self, amount: impl Into<Value>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Coerces and checks every present field.
    pub fn validate(self) -> Result<TxPatch, SyncError> {
        let kind = self.kind.as_deref().map(str::parse::<TxKind>).transpose()?;
        let category = self.category.as_deref().map(validate_category).transpose()?;
        let amount = match self.amount {
            None => None,
            Some(v) => {
                let d = coerce_amount(Some(&v)).ok_or_else(|| {
                    SyncError::validation(format!("amount '{}' is not a number", v))
                })?;
                Some(validate_amount(d)?)
            }
        };
        let date = match self.date {
            Some(d) if d.trim().is_empty() => {
                return Err(SyncError::validation("date must not be blank"));
            }
            other => other.map(|d| d.trim().to_string()),
        };
        Ok(TxPatch {
            kind,
            category,
            amount,
            date,
        })
    }
}

/// A validated partial edit; absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxPatch {
    pub kind: Option<TxKind>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
}

fn validate_category(raw: &str) -> Result<String, SyncError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SyncError::validation("category must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_amount_f64(amount: f64) -> Result<Decimal, SyncError> {
    if !amount.is_finite() {
        return Err(SyncError::validation(format!(
            "amount {} is not a finite number",
            amount
        )));
    }
    let d = Decimal::try_from(amount)
        .map_err(|_| SyncError::validation(format!("amount {} is out of range", amount)))?;
    validate_amount(d)
}

fn validate_amount(d: Decimal) -> Result<Decimal, SyncError> {
    if d <= Decimal::ZERO {
        return Err(SyncError::validation(format!(
            "amount must be greater than zero, got {}",
            d
        )));
    }
    Ok(d)
}

/// Category totals over a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub savings: Decimal,
}

impl Totals {
    pub fn balance(&self) -> Decimal {
        self.income - self.expenses - self.savings
    }
}

/// Denormalized per-identity profile document. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub balance: Decimal,
    pub totals: Totals,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Profile {
    /// Fresh profile for a first sign-in.
    pub fn initial(identity: &Identity) -> Self {
        Self {
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            photo_url: identity.photo_url.clone(),
            ..Self::default()
        }
    }
}

/// Minimal identity record; also what gets cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("User")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn from_raw_accepts_well_formed_record() {
        let raw = json!({
            "id": "a1", "type": "expense", "category": " Food ",
            "amount": 12.5, "date": "2025-01-02", "createdAt": 7
        });
        let tx = Transaction::from_raw(&raw).unwrap();
        assert_eq!(tx.kind, TxKind::Expense);
        assert_eq!(tx.category, "Food");
        assert_eq!(tx.amount, "12.5".parse::<Decimal>().unwrap());
        assert_eq!(tx.created_at, Some(7));
        assert_eq!(tx.day_of_month(), Some(2));
    }

    #[test]
    fn from_raw_rejects_unknown_type_and_missing_id() {
        assert!(Transaction::from_raw(&json!({"id": "x", "type": "gift", "amount": 1})).is_none());
        assert!(Transaction::from_raw(&json!({"type": "income", "amount": 1})).is_none());
        assert!(Transaction::from_raw(&json!("not an object")).is_none());
    }

    #[test]
    fn from_raw_coerces_bad_amount_and_category() {
        let tx = Transaction::from_raw(&json!({"id": "x", "type": "income", "amount": "lots"}))
            .unwrap();
        assert_eq!(tx.amount, Decimal::ZERO);
        assert_eq!(tx.category, UNCATEGORIZED);
        assert_eq!(tx.day_of_month(), None);
    }

    #[test]
    fn from_raw_drops_negative_amounts() {
        let raw = json!({"id": "r", "type": "expense", "amount": -40, "date": "2025-01-04"});
        assert!(Transaction::from_raw(&raw).is_none());
        let raw = json!({"id": "r", "type": "expense", "amount": "-0.01"});
        assert!(Transaction::from_raw(&raw).is_none());
    }

    #[test]
    fn snapshot_from_raw_drops_only_bad_records() {
        let snap = Snapshot::from_raw(vec![
            json!({"id": "1", "type": "income", "amount": 5, "date": "2025-01-01"}),
            json!({"id": "2", "type": "bogus", "amount": 5}),
            json!({"id": "3", "type": "savings", "amount": 2, "date": "2025-01-03"}),
        ]);
        let ids: Vec<_> = snap.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        let newest: Vec<_> = snap.newest_first().map(|t| t.id.as_str()).collect();
        assert_eq!(newest, ["3", "1"]);
    }

    #[test]
    fn draft_defaults_date_to_now() {
        let tx = Draft::new("income", "Salary", 1000.0).validate(now()).unwrap();
        assert_eq!(tx.date, "2025-01-15T09:30:00.000Z");
        assert_eq!(tx.amount, Decimal::from(1000));
    }

    #[test]
    fn draft_rejects_invalid_fields() {
        for draft in [
            Draft::new("income", "Salary", -5.0),
            Draft::new("income", "Salary", 0.0),
            Draft::new("income", "Salary", f64::NAN),
            Draft::new("income", "Salary", f64::INFINITY),
            Draft::new("income", "   ", 10.0),
            Draft::new("bonus", "Salary", 10.0),
        ] {
            assert!(matches!(draft.validate(now()), Err(SyncError::Validation(_))));
        }
    }

    #[test]
    fn patch_coerces_string_amount() {
        let patch = PatchInput::default().amount("42.10").validate().unwrap();
        assert_eq!(patch.amount, Some("42.10".parse().unwrap()));
        assert!(patch.kind.is_none());
    }

    #[test]
    fn patch_rejects_non_positive_or_non_numeric_amount() {
        assert!(PatchInput::default().amount(-1).validate().is_err());
        assert!(PatchInput::default().amount("ten").validate().is_err());
        assert!(PatchInput::default().category(" ").validate().is_err());
        assert!(PatchInput::default().kind("refund").validate().is_err());
    }

    #[test]
    fn first_name_falls_back_to_user() {
        assert_eq!(Identity::new("u").with_name("Asha Rao").first_name(), "Asha");
        assert_eq!(Identity::new("u").first_name(), "User");
    }
}
