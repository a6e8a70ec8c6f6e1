//! Session authority: anti-forgery token and expiry flag shared across
//! concurrently in-flight requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Holds the current anti-forgery token and the session-expired flag.
///
/// Read by the gatekeeper before every dispatch; written when a 401 is
/// observed or when the host application rotates the token after
/// re-authentication.
#[derive(Debug, Default)]
pub struct SessionAuthority {
    csrf_token: RwLock<Option<String>>,
    expired: AtomicBool,
}

impl SessionAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn csrf_token(&self) -> Option<String> {
        match self.csrf_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_csrf_token(&self, token: impl Into<String>) {
        let token = token.into();
        match self.csrf_token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }

    /// Mark the session expired. Returns `true` when this call flipped the
    /// flag, so the caller can deduplicate expiry notifications.
    pub fn mark_expired(&self) -> bool {
        !self.expired.swap(true, Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Clear the expired flag and install a fresh token after
    /// re-authentication.
    pub fn reset(&self, token: Option<String>) {
        match self.csrf_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
        self.expired.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// TESTS
// =============================================================================
