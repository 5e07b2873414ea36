// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use tracing::{debug, info};

use crate::analytics::{derive, DerivedAnalytics, SeriesWindow};
use crate::cache::SnapshotCache;
use crate::channel::SyncChannel;
use crate::error::SyncError;
use crate::gateway::MutationGateway;
use crate::models::{Identity, Snapshot};
use crate::store::TransactionStore;

type Listener = Box<dyn FnMut(&Snapshot, &DerivedAnalytics) + Send>;

/// Everything owned on behalf of one signed-in identity.
///
/// Created by the session gate on sign-in and dropped on sign-out. Holds the
/// single live feed for the identity, the latest snapshot and the analytics
/// derived from it.
pub struct Session<S: TransactionStore + ?Sized> {
    identity: Identity,
    store: Arc<S>,
    cache: Arc<SnapshotCache>,
    channel: SyncChannel,
    window: SeriesWindow,
    snapshot: Snapshot,
    analytics: DerivedAnalytics,
    listener: Option<Listener>,
}

impl<S: TransactionStore + ?Sized> Session<S> {
    /// Seeds from the local cache, then opens the live feed.
    pub async fn open(
        identity: Identity,
        store: Arc<S>,
        cache: Arc<SnapshotCache>,
        window: SeriesWindow,
    ) -> Result<Self, SyncError> {
        let snapshot = cache.read().unwrap_or_default();
        debug!(uid = %identity.uid, cached = snapshot.len(), "seeded session from cache");
        let analytics = derive(&snapshot, window);

        let mut channel = SyncChannel::new();
        channel.open(store.as_ref(), &identity.uid).await?;

        Ok(Self {
            identity,
            store,
            cache,
            channel,
            window,
            snapshot,
            analytics,
            listener: None,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn analytics(&self) -> &DerivedAnalytics {
        &self.analytics
    }

    pub fn is_live(&self) -> bool {
        self.channel.is_active()
    }

    pub fn gateway(&self) -> MutationGateway<S> {
        MutationGateway::new(Arc::clone(&self.store), self.identity.uid.clone())
    }

    /// Registers the callback run after every applied delivery.
    pub fn on_change(&mut self, listener: impl FnMut(&Snapshot, &DerivedAnalytics) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Waits for and applies the next delivery.
    ///
    /// `Ok(false)` once the feed is closed. A terminal feed error is returned
    /// and the last applied snapshot stays in place.
    pub async fn pump(&mut self) -> Result<bool, SyncError> {
        match self.channel.next_delivery().await {
            Some(delivery) => {
                self.apply(delivery?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Applies every delivery already queued, oldest first.
    pub fn drain(&mut self) -> Result<usize, SyncError> {
        let mut applied = 0;
        while let Some(delivery) = self.channel.try_next_delivery() {
            self.apply(delivery?);
            applied += 1;
        }
        Ok(applied)
    }

    fn apply(&mut self, snapshot: Snapshot) {
        self.cache.write(&snapshot);
        self.analytics = derive(&snapshot, self.window);
        self.snapshot = snapshot;
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.snapshot, &self.analytics);
        }
    }

    /// Stops the feed. No listener runs after this returns.
    pub fn close(&mut self) {
        self.channel.cancel();
        self.listener = None;
        info!(uid = %self.identity.uid, "session closed");
    }
}
