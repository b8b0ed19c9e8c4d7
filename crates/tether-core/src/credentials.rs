//! Credential provider seam.
//!
//! Authentication decisions live outside this subsystem. The sync layer
//! only needs two things from the credential store: the current bearer
//! token, and a place to report that the server rejected it so the store
//! can run its logout side-effect.

use parking_lot::Mutex;

/// Supplies the current bearer token and absorbs auth side-effects.
///
/// Implemented by the embedding application's credential store. Both the
/// socket manager (token in the connection URL) and the streaming client
/// (bearer header, 401 handling) consume this trait.
pub trait CredentialProvider: Send + Sync {
    /// The current bearer token, if a user is signed in.
    fn bearer_token(&self) -> Option<String>;

    /// Called when the server rejects the token (HTTP 401).
    fn on_unauthorized(&self);
}

/// Fixed-token provider for tests and simple embedders.
///
/// [`CredentialProvider::on_unauthorized`] clears the stored token, which
/// mirrors the logout-on-401 behavior of a real credential store.
pub struct StaticCredentials {
    token: Mutex<Option<String>>,
}

impl StaticCredentials {
    /// Create a provider holding the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    /// Create a provider with no token (signed-out state).
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            token: Mutex::new(None),
        }
    }

    /// Whether the token has been cleared.
    #[must_use]
    pub fn is_signed_out(&self) -> bool {
        self.token.lock().is_none()
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn on_unauthorized(&self) {
        tracing::warn!("bearer token rejected, clearing credentials");
        *self.token.lock() = None;
    }
}
