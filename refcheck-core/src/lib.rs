//! REFCHECK Core - Entity Types
//!
//! Pure data structures and deterministic logic for the refcheck client.
//! No I/O lives here: the synchronization layer in `refcheck-client`
//! depends on this crate, never the other way around.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod audit;
pub mod entities;
pub mod enums;
pub mod error;
pub mod reports;
pub mod types;

pub use audit::{compare, format_date_for_display, FieldComparison};
pub use entities::{HasEntityId, PartyRef, Referee, Reference, User};
pub use enums::{ReferenceStatus, ReferenceStatusParseError, Severity, Transition};
pub use error::{ValidationError, ValidationResult};
pub use reports::{
    BoardCount, PriorityCount, ReportKind, ReportPayload, StatusCount, UserCount,
};
pub use types::{
    AuditResponse, CreateRefereeRequest, CreateReferenceRequest, ListRefereesRequest,
    ListRefereesResponse, ListReferencesRequest, ListReferencesResponse, NewRefereeDetails,
    RefereeSource, SubmitReferenceFormRequest, UpdateRefereeRequest, UpdateReferenceRequest,
};

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}
