// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod analytics;
pub mod auth;
pub mod cache;
pub mod channel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;
pub mod utils;

pub use analytics::{derive, DerivedAnalytics, Series, SeriesWindow};
pub use auth::{AuthState, IdentityProvider, SessionGate};
pub use cache::{BlobStore, MemoryBlobStore, SnapshotCache, SqliteBlobStore};
pub use channel::SyncChannel;
pub use error::{AuthFailure, StoreError, SyncError};
pub use gateway::MutationGateway;
pub use models::{Draft, Identity, PatchInput, Profile, Snapshot, Totals, Transaction, TxKind};
pub use session::Session;
pub use store::{FeedEvent, MemoryStore, TransactionStore};
