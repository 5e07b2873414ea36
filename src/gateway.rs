// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::SyncError;
use crate::models::{Draft, PatchInput, TxId};
use crate::store::TransactionStore;

/// Issues mutations for one identity's transactions.
///
/// Nothing here touches a local snapshot. Results become visible through the
/// next feed delivery.
pub struct MutationGateway<S: ?Sized> {
    store: Arc<S>,
    uid: String,
}

impl<S: ?Sized> Clone for MutationGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            uid: self.uid.clone(),
        }
    }
}

impl<S> MutationGateway<S>
where
    S: TransactionStore + ?Sized,
{
    pub fn new(store: Arc<S>, uid: impl Into<String>) -> Self {
        Self {
            store,
            uid: uid.into(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Validates `draft` locally, then submits it. Returns the store-assigned id.
    #[instrument(skip(self, draft), fields(uid = %self.uid))]
    pub async fn create(&self, draft: Draft) -> Result<TxId, SyncError> {
        let tx = draft.validate(Utc::now())?;
        let id = self
            .store
            .create(&self.uid, tx)
            .await
            .map_err(SyncError::from_store)?;
        info!(%id, "transaction created");
        Ok(id)
    }

    #[instrument(skip(self, patch), fields(uid = %self.uid))]
    pub async fn update(&self, id: &str, patch: PatchInput) -> Result<(), SyncError> {
        let patch = patch.validate()?;
        self.store
            .update(&self.uid, id, &patch)
            .await
            .map_err(SyncError::from_store)?;
        info!("transaction updated");
        Ok(())
    }

    /// Absent ids are fine; any error the store does report comes back as `UpdateFailed`.
    #[instrument(skip(self), fields(uid = %self.uid))]
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.store
            .delete(&self.uid, id)
            .await
            .map_err(|e| SyncError::UpdateFailed(e.to_string()))?;
        info!("transaction deleted");
        Ok(())
    }

    /// Deletes every record one by one and returns how many were removed.
    ///
    /// Not transactional. If any deletion fails the rest are still attempted
    /// and the ids that could not be confirmed come back in
    /// [`SyncError::DeleteIncomplete`].
    #[instrument(skip(self), fields(uid = %self.uid))]
    pub async fn delete_all(&self) -> Result<usize, SyncError> {
        let ids = self
            .store
            .list_ids(&self.uid)
            .await
            .map_err(|e| SyncError::UpdateFailed(e.to_string()))?;

        let mut deleted = 0;
        let mut unconfirmed = Vec::new();
        for id in ids {
            match self.store.delete(&self.uid, &id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(%id, error = %e, "delete not confirmed");
                    unconfirmed.push(id);
                }
            }
        }

        if unconfirmed.is_empty() {
            info!(deleted, "all transactions deleted");
            Ok(deleted)
        } else {
            Err(SyncError::DeleteIncomplete {
                unconfirmed,
                deleted,
            })
        }
    }
}
