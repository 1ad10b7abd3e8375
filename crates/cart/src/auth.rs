//! Authentication status for the cart engine.
//!
//! The engine depends only on whether a user is currently signed in plus a
//! stable user identifier; how sign-in is implemented is someone else's
//! problem. Status is published through a `tokio::sync::watch` channel:
//! the application's auth flow holds the [`AuthHandle`] and publishes
//! transitions, the engine holds a receiver and reloads its cart on every
//! change.

use axle_core::UserId;
use tokio::sync::watch;

/// Current visitor identity, as far as the cart is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Anonymous visitor; the cart lives in the local store.
    #[default]
    Guest,
    /// Known user; the remote cart is authoritative.
    SignedIn(UserId),
}

impl AuthState {
    /// The signed-in user's id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Guest => None,
            Self::SignedIn(user) => Some(user),
        }
    }

    /// Whether a user is currently signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Producer side of the auth status channel.
///
/// Dropping the handle closes the channel, which also winds down the
/// engine's auth-watcher task.
#[derive(Debug)]
pub struct AuthHandle {
    tx: watch::Sender<AuthState>,
}

impl AuthHandle {
    /// Publish a sign-in transition.
    pub fn sign_in(&self, user: UserId) {
        let _ = self.tx.send(AuthState::SignedIn(user));
    }

    /// Publish a sign-out transition.
    pub fn sign_out(&self) {
        let _ = self.tx.send(AuthState::Guest);
    }

    /// Current state as last published.
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Create an additional status receiver.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}

/// Create an auth status channel, starting as [`AuthState::Guest`].
#[must_use]
pub fn auth_channel() -> (AuthHandle, watch::Receiver<AuthState>) {
    let (tx, rx) = watch::channel(AuthState::Guest);
    (AuthHandle { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transitions_are_observed() {
        let (handle, mut rx) = auth_channel();
        assert_eq!(*rx.borrow(), AuthState::Guest);

        handle.sign_in(UserId::new("user-7"));
        rx.changed().await.expect("sender alive");
        assert_eq!(
            rx.borrow().user_id().map(UserId::as_str),
            Some("user-7")
        );

        handle.sign_out();
        rx.changed().await.expect("sender alive");
        assert!(!rx.borrow().is_signed_in());
    }

    #[test]
    fn test_current_reflects_last_publish() {
        let (handle, _rx) = auth_channel();
        handle.sign_in(UserId::new("user-1"));
        assert!(handle.current().is_signed_in());
    }
}
