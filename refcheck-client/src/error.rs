//! Error taxonomy for the synchronization layer.

use crate::config::ConfigError;
use crate::transport::TransportError;
use refcheck_core::ValidationError;
use thiserror::Error;

/// Master error type for the synchronization layer.
///
/// `Network` and `Http` failures are also reported once through the
/// notifier by the gatekeeper; the two channels are independent, so a
/// caller that ignores the returned error still leaves the user informed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport-level failure; no response was received.
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// The server responded with a non-2xx status not covered by a
    /// dedicated variant.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A 401 was observed; the session authority's expired flag is set.
    #[error("Session expired or unauthorized")]
    SessionExpired,

    /// A 403 was observed; session state is untouched.
    #[error("Insufficient permission")]
    PermissionDenied,

    /// Client-side precondition failure; never reached the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request or response JSON codec failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Whether this error was resolved client-side without any dispatch.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}

/// Result type alias for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// TESTS
// =============================================================================
