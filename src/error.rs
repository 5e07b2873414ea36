// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::models::TxId;

/// Errors surfaced to callers of the sync engine.
///
/// Remote failures keep the store's message verbatim; nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("invalid transaction: {0}")]
    Validation(String),

    #[error("transaction '{0}' not found")]
    NotFound(TxId),

    #[error("store rejected the change: {0}")]
    UpdateFailed(String),

    #[error("transaction feed ended: {0}")]
    Subscription(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(
        "{} of {} transactions could not be confirmed deleted",
        unconfirmed.len(),
        unconfirmed.len() + deleted
    )]
    DeleteIncomplete { unconfirmed: Vec<TxId>, deleted: usize },
}

impl SyncError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        SyncError::Validation(msg.into())
    }

    /// Maps a store failure on a mutation of `id`.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SyncError::NotFound(id),
            other => SyncError::UpdateFailed(other.to_string()),
        }
    }
}

/// Failures reported by an authoritative store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record '{0}' does not exist")]
    NotFound(TxId),

    #[error("{0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Sign-in/out failures reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("the sign-in popup was blocked by the browser")]
    PopupBlocked,

    #[error("the sign-in popup was closed before completing")]
    PopupClosed,

    #[error(
        "an account already exists with a different sign-in method; use the original provider and link accounts"
    )]
    AccountExistsWithDifferentCredential,

    #[error("{0}")]
    Provider(String),
}

impl AuthFailure {
    /// Popup failures that the redirect flow can recover from.
    pub fn is_popup_failure(&self) -> bool {
        matches!(self, AuthFailure::PopupBlocked | AuthFailure::PopupClosed)
    }
}

impl From<AuthFailure> for SyncError {
    fn from(err: AuthFailure) -> Self {
        SyncError::Auth(err.to_string())
    }
}
