//! Authentication collaborator seam.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Supplies and manages the sync credential.
///
/// The engine never stores credentials itself; it asks this collaborator
/// for a bearer token before a round and tells it to erase the credential
/// when the server rejects it (HTTP 401) or validation reports it expired.
pub trait AuthProvider: Send + Sync {
    /// Returns the current bearer token, if a credential is stored.
    fn token(&self) -> Option<String>;

    /// Checks whether the stored credential is still valid.
    fn validate_token(&self) -> bool;

    /// Erases the stored credential.
    fn invalidate(&self);
}

/// An auth provider holding a fixed token.
///
/// Used by the CLI (token from flags/environment) and by tests.
#[derive(Debug, Default)]
pub struct StaticAuth {
    token: Mutex<Option<String>>,
    valid: AtomicBool,
}

impl StaticAuth {
    /// Creates a provider with a stored, valid token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
            valid: AtomicBool::new(true),
        }
    }

    /// Creates a provider with no stored credential.
    #[must_use]
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Marks the stored credential valid or expired.
    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }
}

impl AuthProvider for StaticAuth {
    fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn validate_token(&self) -> bool {
        self.valid.load(Ordering::SeqCst) && self.token.lock().is_some()
    }

    fn invalidate(&self) {
        *self.token.lock() = None;
        self.valid.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_auth_lifecycle() {
        let auth = StaticAuth::new("tok-1");
        assert_eq!(auth.token(), Some("tok-1".to_string()));
        assert!(auth.validate_token());

        auth.invalidate();
        assert_eq!(auth.token(), None);
        assert!(!auth.validate_token());
    }

    #[test]
    fn logged_out_has_no_token() {
        let auth = StaticAuth::logged_out();
        assert_eq!(auth.token(), None);
        assert!(!auth.validate_token());
    }

    #[test]
    fn expired_token_fails_validation() {
        let auth = StaticAuth::new("tok-1");
        auth.set_valid(false);
        assert!(auth.token().is_some());
        assert!(!auth.validate_token());
    }
}
