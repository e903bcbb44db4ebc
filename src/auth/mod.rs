//! Identity: live sign-in state pushed over a watch channel.
//!
//! Exactly one identity is signed in at a time. Consumers either sample
//! [`AuthService::current_user`] or subscribe and re-derive whatever they
//! gate on each time the state changes.

pub mod credentials;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::User;
use crate::storage::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Startup, before the initial state has been resolved. Gates treat
    /// this the same as signed out.
    Loading,
    SignedOut,
    SignedIn(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    state: watch::Sender<AuthState>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { users, state }
    }

    /// Resolve the initial state. There is no persisted session to restore,
    /// so boot always lands on `SignedOut`.
    pub fn start(&self) {
        if matches!(*self.state.borrow(), AuthState::Loading) {
            self.state.send_replace(AuthState::SignedOut);
        }
    }

    /// Subscribe to state transitions. The receiver always sees the latest
    /// state on `borrow`, even if intermediate transitions were missed.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .verify_credentials(email, password)
            .await?
            .ok_or(Error::InvalidCredentials)?;
        info!("{} signed in", user.email);
        self.state.send_replace(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    /// Signing out while already signed out is a no-op.
    pub fn logout(&self) {
        let previous = self.state.send_replace(AuthState::SignedOut);
        if let AuthState::SignedIn(user) = previous {
            info!("{} signed out", user.email);
        }
    }
}
