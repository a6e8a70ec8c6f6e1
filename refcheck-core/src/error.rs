//! Client-side validation errors.
//!
//! The network-facing error taxonomy lives in `refcheck-client`; this module
//! holds only the failures that are resolved synchronously at the call site
//! and never produce a request.

use crate::enums::{ReferenceStatus, Transition};
use crate::EntityId;
use thiserror::Error;

/// A precondition failure detected before any network dispatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cannot {attempted} a reference in status {from}")]
    InvalidTransition {
        from: ReferenceStatus,
        attempted: Transition,
    },

    #[error("Rejection reason must not be empty")]
    MissingRejectionReason,

    #[error("Reference {id} is not known to this client")]
    UnknownReference { id: EntityId },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Result type alias for guard checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// TESTS
// =============================================================================
