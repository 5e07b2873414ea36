// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, warn};

use crate::db;
use crate::models::{Identity, Snapshot};

/// Synchronous key/value persistence for serialized blobs.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed blobs in a single `blobs` table.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(db::open_or_init(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("cache connection poisoned"))?;
        Ok(f(&conn)?)
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|c| {
            c.query_row("SELECT value FROM blobs WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|c| {
            c.execute(
                "INSERT INTO blobs(key, value) VALUES(?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=datetime('now')",
                params![key, value],
            )
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_conn(|c| c.execute("DELETE FROM blobs WHERE key=?1", params![key]))?;
        Ok(())
    }
}

/// Process-local blobs. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    map: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.map
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let m = self.map.lock().map_err(|_| anyhow!("blob map poisoned"))?;
        Ok(m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut m = self.map.lock().map_err(|_| anyhow!("blob map poisoned"))?;
        m.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut m = self.map.lock().map_err(|_| anyhow!("blob map poisoned"))?;
        m.remove(key);
        Ok(())
    }
}

/// Last-known snapshot and identity, namespaced per installation.
///
/// Every operation is total: storage failures are logged and reported as
/// "nothing cached". This is never a source of truth for mutations.
pub struct SnapshotCache {
    blobs: Box<dyn BlobStore>,
    namespace: String,
}

impl SnapshotCache {
    pub fn new(blobs: impl BlobStore + 'static, namespace: impl Into<String>) -> Self {
        Self {
            blobs: Box::new(blobs),
            namespace: namespace.into(),
        }
    }

    fn snapshot_key(&self) -> String {
        format!("{}:tx", self.namespace)
    }

    fn identity_key(&self) -> String {
        format!("{}:user", self.namespace)
    }

    pub fn read(&self) -> Option<Snapshot> {
        let raw = self.get_blob(&self.snapshot_key())?;
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(rows) => Some(Snapshot::from_raw(rows)),
            Err(e) => {
                warn!(error = %e, "cached snapshot is unreadable; ignoring");
                None
            }
        }
    }

    /// Replaces the cached snapshot wholesale.
    pub fn write(&self, snapshot: &Snapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                self.set_blob(&self.snapshot_key(), &json);
                debug!(records = snapshot.len(), "cached snapshot");
            }
            Err(e) => warn!(error = %e, "could not serialize snapshot for cache"),
        }
    }

    pub fn read_identity(&self) -> Option<Identity> {
        let raw = self.get_blob(&self.identity_key())?;
        serde_json::from_str(&raw)
            .map_err(|e| warn!(error = %e, "cached identity is unreadable; ignoring"))
            .ok()
    }

    pub fn write_identity(&self, identity: &Identity) {
        match serde_json::to_string(identity) {
            Ok(json) => self.set_blob(&self.identity_key(), &json),
            Err(e) => warn!(error = %e, "could not serialize identity for cache"),
        }
    }

    /// Drops the cached snapshot and identity.
    pub fn clear(&self) {
        for key in [self.snapshot_key(), self.identity_key()] {
            if let Err(e) = self.blobs.remove(&key) {
                warn!(key = %key, error = %e, "cache remove failed");
            }
        }
    }

    fn get_blob(&self, key: &str) -> Option<String> {
        self.blobs
            .get(key)
            .map_err(|e| warn!(key, error = %e, "cache read failed"))
            .ok()
            .flatten()
    }

    fn set_blob(&self, key: &str, value: &str) {
        if let Err(e) = self.blobs.set(key, value) {
            warn!(key, error = %e, "cache write failed");
        }
    }
}
