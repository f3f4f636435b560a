//! Session state derived from inbound protocol messages.
//!
//! [`SessionStore`] holds the three fields the presentation layer renders
//! from: the authenticated user, the active account, and the latest account
//! overview. Each is independently nullable until first populated. The store
//! is mutated only from the protocol dispatcher's message-handling path;
//! everything else holds a read-only clone of the handle.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::protocol::{Account, Overview, User};

/// A point-in-time copy of the session fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Authenticated user, once `bootstrap_ok` or `user_switched` supplied one.
    pub user: Option<User>,
    /// Active account.
    pub account: Option<Account>,
    /// Latest overview, set only by `snapshot` frames.
    pub overview: Option<Overview>,
}

impl SessionSnapshot {
    /// True once all three fields are populated — the gate between the
    /// "connecting" placeholder and the full interface.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.user.is_some() && self.account.is_some() && self.overview.is_some()
    }
}

/// Shared session state store.
///
/// Cheap to clone (`Arc` inside); clones observe the same state. Writers
/// are confined to the dispatcher, so the lock is effectively
/// single-writer/many-reader.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionSnapshot>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out the current session fields.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().clone()
    }

    /// Whether the full interface should render (all fields populated).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.read().is_ready()
    }

    /// Apply a `bootstrap_ok` payload: user and account are set in one
    /// write-lock section so readers never observe one without the other.
    /// Absent fields leave existing state alone.
    pub fn apply_bootstrap(&self, user: Option<User>, account: Option<Account>) {
        let mut state = self.inner.write();
        if let Some(user) = user {
            state.user = Some(user);
        }
        if let Some(account) = account {
            state.account = Some(account);
        }
    }

    /// Replace the overview verbatim from a `snapshot` frame.
    pub fn set_overview(&self, overview: Overview) {
        self.inner.write().overview = Some(overview);
    }

    /// Replace the user after `user_switched`. The overview is left in
    /// place and is stale until the caller's next snapshot round-trip.
    pub fn set_user(&self, user: User) {
        self.inner.write().user = Some(user);
    }

    /// Replace the account after `account_switched`. Overview staleness as
    /// with [`Self::set_user`].
    pub fn set_account(&self, account: Account) {
        self.inner.write().account = Some(account);
    }

    /// Clear everything. Used only when a brand-new session begins.
    pub fn reset(&self) {
        *self.inner.write() = SessionSnapshot::default();
    }
}
