// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analytics::SeriesWindow;
use crate::cache::SnapshotCache;
use crate::error::{AuthFailure, SyncError};
use crate::models::{Identity, Profile};
use crate::session::Session;
use crate::store::TransactionStore;

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity behind the provider's cached credential, if any.
    async fn current_identity(&self) -> Result<Option<Identity>, AuthFailure>;

    /// Result of a redirect sign-in started before the last restart.
    async fn take_redirect_result(&self) -> Result<Option<Identity>, AuthFailure>;

    async fn sign_in_popup(&self) -> Result<Identity, AuthFailure>;

    /// Starts a redirect sign-in. `Ok(None)` means the identity arrives later
    /// through [`IdentityProvider::watch_identity`].
    async fn sign_in_redirect(&self) -> Result<Option<Identity>, AuthFailure>;

    async fn sign_out(&self) -> Result<(), AuthFailure>;

    /// Notifications of the current identity changing.
    fn watch_identity(&self) -> watch::Receiver<Option<Identity>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(Identity),
    /// Human-readable cause of the last failure.
    Error(String),
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Authentication state machine owning the active [`Session`].
///
/// A session (and with it the live feed) exists only while authenticated.
/// Sign-out cancels the feed before any cached data is cleared.
pub struct SessionGate<P: ?Sized, S: TransactionStore + ?Sized> {
    provider: Arc<P>,
    store: Arc<S>,
    cache: Arc<SnapshotCache>,
    window: SeriesWindow,
    state: AuthState,
    session: Option<Session<S>>,
    profiled: HashSet<String>,
    changes: watch::Receiver<Option<Identity>>,
    last_known: Option<Identity>,
}

impl<P, S> SessionGate<P, S>
where
    P: IdentityProvider + ?Sized,
    S: TransactionStore + ?Sized,
{
    pub fn new(
        provider: Arc<P>,
        store: Arc<S>,
        cache: Arc<SnapshotCache>,
        window: SeriesWindow,
    ) -> Self {
        let changes = provider.watch_identity();
        let last_known = cache.read_identity();
        Self {
            provider,
            store,
            cache,
            window,
            state: AuthState::Unauthenticated,
            session: None,
            profiled: HashSet::new(),
            changes,
            last_known,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session<S>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<S>> {
        self.session.as_mut()
    }

    /// Identity cached from a previous run, shown while the credential check runs.
    pub fn last_known_identity(&self) -> Option<&Identity> {
        self.last_known.as_ref()
    }

    /// Cold start: finishes a pending redirect, then checks the cached credential.
    pub async fn restore(&mut self) -> Result<(), SyncError> {
        self.state = AuthState::Authenticating;
        match self.provider.take_redirect_result().await {
            Ok(Some(identity)) => return self.authenticated(identity).await,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring failed redirect result"),
        }
        match self.provider.current_identity().await {
            Ok(Some(identity)) => self.authenticated(identity).await,
            Ok(None) => {
                self.teardown();
                self.state = AuthState::Unauthenticated;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Popup sign-in, falling back to the redirect flow when the popup is
    /// blocked or closed.
    pub async fn sign_in(&mut self) -> Result<(), SyncError> {
        self.state = AuthState::Authenticating;
        let identity = match self.provider.sign_in_popup().await {
            Ok(identity) => identity,
            Err(e) if e.is_popup_failure() => {
                info!(reason = %e, "popup sign-in failed; trying redirect");
                match self.provider.sign_in_redirect().await {
                    Ok(Some(identity)) => identity,
                    Ok(None) => {
                        debug!("redirect sign-in pending");
                        return Ok(());
                    }
                    Err(e) => return self.fail(e),
                }
            }
            Err(e) => return self.fail(e),
        };
        self.authenticated(identity).await
    }

    pub async fn sign_out(&mut self) -> Result<(), SyncError> {
        self.teardown();
        match self.provider.sign_out().await {
            Ok(()) => {
                self.state = AuthState::Unauthenticated;
                info!("signed out");
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Applies one "current identity changed" notification.
    pub async fn handle_identity_change(
        &mut self,
        change: Option<Identity>,
    ) -> Result<(), SyncError> {
        match change {
            Some(identity) => self.authenticated(identity).await,
            None => {
                self.teardown();
                self.state = AuthState::Unauthenticated;
                Ok(())
            }
        }
    }

    /// Waits for the provider's next identity notification and applies it.
    /// `None` once the provider stops publishing.
    pub async fn next_identity_change(&mut self) -> Option<Result<(), SyncError>> {
        self.changes.changed().await.ok()?;
        let change = self.changes.borrow_and_update().clone();
        Some(self.handle_identity_change(change).await)
    }

    async fn authenticated(&mut self, identity: Identity) -> Result<(), SyncError> {
        if let Some(session) = &self.session {
            if session.identity().uid == identity.uid {
                self.state = AuthState::Authenticated(identity);
                return Ok(());
            }
            info!(from = %session.identity().uid, to = %identity.uid, "identity switched");
            self.teardown();
        }

        self.state = AuthState::Authenticating;
        self.discard_foreign_cache(&identity);
        self.ensure_profile(&identity).await;
        let session = match Session::open(
            identity.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
            self.window,
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "could not open session");
                self.state = AuthState::Error(e.to_string());
                return Err(e);
            }
        };

        self.cache.write_identity(&identity);
        self.last_known = Some(identity.clone());
        self.session = Some(session);
        info!(uid = %identity.uid, "authenticated");
        self.state = AuthState::Authenticated(identity);
        Ok(())
    }

    /// The cached snapshot is only seeded into a session of the identity that
    /// wrote it. Anything else, including a snapshot with no cached owner, is dropped.
    fn discard_foreign_cache(&mut self, identity: &Identity) {
        let owner = self.cache.read_identity();
        if owner.as_ref().is_some_and(|o| o.uid == identity.uid) {
            return;
        }
        debug!(
            owner = owner.as_ref().map(|o| o.uid.as_str()),
            uid = %identity.uid,
            "discarding cache written by another identity"
        );
        self.cache.clear();
        self.last_known = None;
    }

    /// Creates the profile document if absent, once per identity seen by this gate.
    /// Failures are logged and retried on the next authentication.
    async fn ensure_profile(&mut self, identity: &Identity) {
        if self.profiled.contains(&identity.uid) {
            return;
        }
        let uid = identity.uid.as_str();
        let done = match self.store.profile(uid).await {
            Ok(Some(_)) => true,
            Ok(None) => match self.store.put_profile(uid, &Profile::initial(identity)).await {
                Ok(()) => {
                    info!(uid, "profile created");
                    true
                }
                Err(e) => {
                    warn!(uid, error = %e, "profile creation failed");
                    false
                }
            },
            Err(e) => {
                warn!(uid, error = %e, "profile lookup failed");
                false
            }
        };
        if done {
            self.profiled.insert(identity.uid.clone());
        }
    }

    /// Feed first, then cached data.
    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.cache.clear();
        self.last_known = None;
    }

    fn fail(&mut self, e: AuthFailure) -> Result<(), SyncError> {
        warn!(error = %e, "authentication failed");
        self.state = AuthState::Error(e.to_string());
        Err(e.into())
    }
}
