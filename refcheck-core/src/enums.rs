//! Enum types for refcheck entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// REFERENCE LIFECYCLE
// ============================================================================

/// Status of a reference request.
///
/// Transitions are forward-only: `Pending -> Sent -> Received -> Completed`,
/// with `Sent -> Rejected` as the one branch. `Completed` and `Rejected` are
/// terminal; the record itself may still be deleted from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReferenceStatus {
    /// Created, not yet sent to the referee
    #[default]
    Pending,
    /// Request delivered to the referee
    Sent,
    /// Referee has filled in the form
    Received,
    /// Reviewed and signed off by the requesting user
    Completed,
    /// Declined by the referee
    Rejected,
}

impl ReferenceStatus {
    /// Wire/display string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceStatus::Pending => "Pending",
            ReferenceStatus::Sent => "Sent",
            ReferenceStatus::Received => "Received",
            ReferenceStatus::Completed => "Completed",
            ReferenceStatus::Rejected => "Rejected",
        }
    }

    /// Position along the forward-only progression. `Rejected` shares the
    /// terminal rank with `Completed` so that no transition ever decreases
    /// this value.
    pub fn rank(&self) -> u8 {
        match self {
            ReferenceStatus::Pending => 0,
            ReferenceStatus::Sent => 1,
            ReferenceStatus::Received => 2,
            ReferenceStatus::Completed => 3,
            ReferenceStatus::Rejected => 3,
        }
    }

    /// Whether no further status transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReferenceStatus::Completed | ReferenceStatus::Rejected)
    }

    /// Whether `transition` may be applied to a reference currently in this
    /// status.
    pub fn can_apply(&self, transition: Transition) -> bool {
        matches!(
            (self, transition),
            (ReferenceStatus::Pending, Transition::Send)
                | (ReferenceStatus::Sent, Transition::Receive)
                | (ReferenceStatus::Sent, Transition::Reject)
                | (ReferenceStatus::Received, Transition::Complete)
        )
    }

    /// The status after applying `transition`, or `None` when the guard
    /// forbids it.
    pub fn apply(&self, transition: Transition) -> Option<ReferenceStatus> {
        if self.can_apply(transition) {
            Some(transition.target())
        } else {
            None
        }
    }
}

impl fmt::Display for ReferenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown reference status: {0}")]
pub struct ReferenceStatusParseError(pub String);

impl FromStr for ReferenceStatus {
    type Err = ReferenceStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReferenceStatus::Pending),
            "Sent" => Ok(ReferenceStatus::Sent),
            "Received" => Ok(ReferenceStatus::Received),
            "Completed" => Ok(ReferenceStatus::Completed),
            "Rejected" => Ok(ReferenceStatus::Rejected),
            other => Err(ReferenceStatusParseError(other.to_string())),
        }
    }
}

/// A guarded status change of an existing reference. Creation and deletion
/// are not transitions: they have no source-status precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    Send,
    Receive,
    Complete,
    Reject,
}

impl Transition {
    /// The status a successful application of this transition yields.
    pub fn target(&self) -> ReferenceStatus {
        match self {
            Transition::Send => ReferenceStatus::Sent,
            Transition::Receive => ReferenceStatus::Received,
            Transition::Complete => ReferenceStatus::Completed,
            Transition::Reject => ReferenceStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Send => "send",
            Transition::Receive => "receive",
            Transition::Complete => "complete",
            Transition::Reject => "reject",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

// =============================================================================
// TESTS
// =============================================================================
