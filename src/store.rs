// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::error::StoreError;
use crate::models::{NewTransaction, Profile, TxId, TxPatch};
use crate::utils::decimal_to_json;

/// One message on a live transaction feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Every record currently stored for the identity, ascending by `date`.
    Snapshot(Vec<Value>),
    /// The subscription failed and will deliver nothing further.
    Terminated(String),
}

pub type FeedReceiver = mpsc::UnboundedReceiver<FeedEvent>;

/// The authoritative, identity-scoped transaction and profile store.
///
/// Records travel as loosely-typed documents; callers are expected to parse
/// them through [`crate::models::Snapshot::from_raw`].
#[async_trait]
pub trait TransactionStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Opens a live feed. A full snapshot is sent on open and after every change.
    async fn subscribe(&self, uid: &str) -> Result<FeedReceiver, StoreError>;

    async fn create(&self, uid: &str, tx: NewTransaction) -> Result<TxId, StoreError>;

    async fn update(&self, uid: &str, id: &str, patch: &TxPatch) -> Result<(), StoreError>;

    /// Removing an absent record succeeds.
    async fn delete(&self, uid: &str, id: &str) -> Result<(), StoreError>;

    async fn list_ids(&self, uid: &str) -> Result<Vec<TxId>, StoreError>;

    async fn profile(&self, uid: &str) -> Result<Option<Profile>, StoreError>;

    async fn put_profile(&self, uid: &str, profile: &Profile) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    docs: HashMap<String, BTreeMap<TxId, Map<String, Value>>>,
    profiles: HashMap<String, Profile>,
    feeds: HashMap<String, Vec<mpsc::UnboundedSender<FeedEvent>>>,
    next_id: u64,
    clock: i64,
    reject_deletes: HashSet<TxId>,
    reject_subscribe: Option<String>,
}

impl MemoryInner {
    fn snapshot_for(&self, uid: &str) -> Vec<Value> {
        let mut rows: Vec<Value> = self
            .docs
            .get(uid)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| {
                        let mut doc = doc.clone();
                        doc.insert("id".into(), Value::String(id.clone()));
                        Value::Object(doc)
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            let key = |v: &Value| {
                (
                    v.get("date").and_then(Value::as_str).unwrap_or("").to_string(),
                    v.get("createdAt").and_then(Value::as_i64).unwrap_or(0),
                )
            };
            key(a).cmp(&key(b))
        });
        rows
    }

    fn broadcast(&mut self, uid: &str) {
        let snapshot = self.snapshot_for(uid);
        if let Some(feeds) = self.feeds.get_mut(uid) {
            feeds.retain(|tx| tx.send(FeedEvent::Snapshot(snapshot.clone())).is_ok());
            debug!(uid, live = feeds.len(), "broadcast snapshot");
        }
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// In-process document store. Backs tests and offline demos.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    remote_calls: AtomicU64,
    profile_writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document as-is, bypassing validation. Emits a snapshot.
    pub async fn insert_raw(&self, uid: &str, id: &str, doc: Value) {
        let mut inner = self.inner.lock().await;
        let doc = match doc {
            Value::Object(map) => map,
            other => {
                let mut m = Map::new();
                m.insert("value".into(), other);
                m
            }
        };
        inner
            .docs
            .entry(uid.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        inner.broadcast(uid);
    }

    /// Makes every future delete of `id` fail.
    pub async fn reject_deletes_of(&self, id: &str) {
        self.inner.lock().await.reject_deletes.insert(id.to_string());
    }

    /// Makes every future subscribe fail with `reason`.
    pub async fn reject_subscriptions(&self, reason: &str) {
        self.inner.lock().await.reject_subscribe = Some(reason.to_string());
    }

    /// Ends every live feed of `uid` with a terminal error.
    pub async fn terminate_feeds(&self, uid: &str, reason: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(feeds) = inner.feeds.remove(uid) {
            for tx in feeds {
                let _ = tx.send(FeedEvent::Terminated(reason.to_string()));
            }
        }
    }

    /// Feeds of `uid` whose receiving end is still open.
    pub async fn live_feeds(&self, uid: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .feeds
            .get(uid)
            .map(|f| f.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    pub async fn count(&self, uid: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.docs.get(uid).map(BTreeMap::len).unwrap_or(0)
    }

    /// Every trait call made so far, successful or not.
    pub fn remote_calls(&self) -> u64 {
        self.remote_calls.load(Ordering::Relaxed)
    }

    pub fn profile_writes(&self) -> u64 {
        self.profile_writes.load(Ordering::Relaxed)
    }

    fn record_call(&self) {
        self.remote_calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn subscribe(&self, uid: &str) -> Result<FeedReceiver, StoreError> {
        self.record_call();
        let mut inner = self.inner.lock().await;
        if let Some(reason) = &inner.reject_subscribe {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(FeedEvent::Snapshot(inner.snapshot_for(uid)));
        inner.feeds.entry(uid.to_string()).or_default().push(tx);
        Ok(rx)
    }

    async fn create(&self, uid: &str, tx: NewTransaction) -> Result<TxId, StoreError> {
        self.record_call();
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = format!("tx{:06}", inner.next_id);
        let created_at = inner.tick();

        let mut doc = Map::new();
        doc.insert("type".into(), Value::String(tx.kind.as_str().into()));
        doc.insert("category".into(), Value::String(tx.category));
        doc.insert("amount".into(), decimal_to_json(tx.amount));
        doc.insert("date".into(), Value::String(tx.date));
        doc.insert("createdAt".into(), Value::from(created_at));

        inner
            .docs
            .entry(uid.to_string())
            .or_default()
            .insert(id.clone(), doc);
        inner.broadcast(uid);
        Ok(id)
    }

    async fn update(&self, uid: &str, id: &str, patch: &TxPatch) -> Result<(), StoreError> {
        self.record_call();
        let mut inner = self.inner.lock().await;
        let doc = inner
            .docs
            .get_mut(uid)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(kind) = patch.kind {
            doc.insert("type".into(), Value::String(kind.as_str().into()));
        }
        if let Some(category) = &patch.category {
            doc.insert("category".into(), Value::String(category.clone()));
        }
        if let Some(amount) = patch.amount {
            doc.insert("amount".into(), decimal_to_json(amount));
        }
        if let Some(date) = &patch.date {
            doc.insert("date".into(), Value::String(date.clone()));
        }
        inner.broadcast(uid);
        Ok(())
    }

    async fn delete(&self, uid: &str, id: &str) -> Result<(), StoreError> {
        self.record_call();
        let mut inner = self.inner.lock().await;
        if inner.reject_deletes.contains(id) {
            return Err(StoreError::Rejected(format!(
                "permission denied deleting '{}'",
                id
            )));
        }
        let removed = inner
            .docs
            .get_mut(uid)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            inner.broadcast(uid);
        }
        Ok(())
    }

    async fn list_ids(&self, uid: &str) -> Result<Vec<TxId>, StoreError> {
        self.record_call();
        let inner = self.inner.lock().await;
        Ok(inner
            .docs
            .get(uid)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn profile(&self, uid: &str) -> Result<Option<Profile>, StoreError> {
        self.record_call();
        Ok(self.inner.lock().await.profiles.get(uid).cloned())
    }

    async fn put_profile(&self, uid: &str, profile: &Profile) -> Result<(), StoreError> {
        self.record_call();
        self.profile_writes.fetch_add(1, Ordering::Relaxed);
        self.inner
            .lock()
            .await
            .profiles
            .insert(uid.to_string(), profile.clone());
        Ok(())
    }
}
