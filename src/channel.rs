// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::models::Snapshot;
use crate::store::{FeedEvent, FeedReceiver, TransactionStore};

struct ActiveFeed {
    uid: String,
    feed: FeedReceiver,
    delivered: u64,
}

/// Holds at most one live transaction feed.
///
/// Deliveries are pulled in the order the store emitted them and parsed into
/// [`Snapshot`]s. Once [`SyncChannel::cancel`] returns, nothing further is
/// delivered: the receiving end is dropped with it.
#[derive(Default)]
pub struct SyncChannel {
    active: Option<ActiveFeed>,
}

impl SyncChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `uid`'s transactions, cancelling any feed for another identity.
    /// Reopening for the identity already being followed keeps the existing feed.
    pub async fn open<S>(&mut self, store: &S, uid: &str) -> Result<(), SyncError>
    where
        S: TransactionStore + ?Sized,
    {
        if self.uid() == Some(uid) {
            debug!(uid, "feed already open");
            return Ok(());
        }
        self.cancel();
        let feed = store
            .subscribe(uid)
            .await
            .map_err(|e| SyncError::Subscription(e.to_string()))?;
        info!(uid, backend = store.backend_tag(), "transaction feed opened");
        self.active = Some(ActiveFeed {
            uid: uid.to_string(),
            feed,
            delivered: 0,
        });
        Ok(())
    }

    /// Idempotent; a no-op when nothing is open.
    pub fn cancel(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.feed.close();
            info!(uid = %active.uid, delivered = active.delivered, "transaction feed cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn uid(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.uid.as_str())
    }

    /// Waits for the next delivery.
    ///
    /// `None` when no feed is open. A terminal feed error is returned once and
    /// leaves the channel closed.
    pub async fn next_delivery(&mut self) -> Option<Result<Snapshot, SyncError>> {
        let active = self.active.as_mut()?;
        let event = active.feed.recv().await;
        Some(self.handle(event))
    }

    /// Takes an already-queued delivery without waiting.
    pub fn try_next_delivery(&mut self) -> Option<Result<Snapshot, SyncError>> {
        let active = self.active.as_mut()?;
        let event = match active.feed.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => None,
        };
        Some(self.handle(event))
    }

    fn handle(&mut self, event: Option<FeedEvent>) -> Result<Snapshot, SyncError> {
        match event {
            Some(FeedEvent::Snapshot(rows)) => {
                if let Some(active) = self.active.as_mut() {
                    active.delivered += 1;
                    debug!(uid = %active.uid, seq = active.delivered, rows = rows.len(), "snapshot delivered");
                }
                Ok(Snapshot::from_raw(rows))
            }
            Some(FeedEvent::Terminated(reason)) => {
                self.fail(&reason);
                Err(SyncError::Subscription(reason))
            }
            None => {
                let reason = "feed closed by store".to_string();
                self.fail(&reason);
                Err(SyncError::Subscription(reason))
            }
        }
    }

    fn fail(&mut self, reason: &str) {
        if let Some(active) = self.active.take() {
            warn!(uid = %active.uid, reason, "transaction feed terminated");
        }
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        self.cancel();
    }
}
