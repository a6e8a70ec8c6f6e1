//! Durable records managed through the refcheck API.
//!
//! These mirror the server's JSON representation: camelCase field names and
//! Mongo-style `_id` identifiers.

use crate::enums::ReferenceStatus;
use crate::{EntityId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Record types that expose their entity id, so a [`PartyRef`] can yield an
/// id regardless of which form it holds.
pub trait HasEntityId {
    fn entity_id(&self) -> EntityId;
}

/// A field that is either a bare identifier or a fully populated record,
/// depending on which endpoint produced the enclosing value. The two forms
/// never mix within one value; the variant is resolved once, at the serde
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartyRef<T> {
    Id(EntityId),
    Embedded(T),
}

impl<T: HasEntityId> PartyRef<T> {
    /// The referenced entity's id, whichever form is held.
    pub fn id(&self) -> EntityId {
        match self {
            PartyRef::Id(id) => *id,
            PartyRef::Embedded(record) => record.entity_id(),
        }
    }

    /// The populated record, when this endpoint embedded one.
    pub fn embedded(&self) -> Option<&T> {
        match self {
            PartyRef::Id(_) => None,
            PartyRef::Embedded(record) => Some(record),
        }
    }
}

/// Minimal account record, as embedded in reference responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    pub email: String,
}

impl HasEntityId for User {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

/// A person nominated to give a reference. No lifecycle state of its own;
/// mutable via CRUD and deleted explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referee {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub owner_user_id: EntityId,
    pub name: String,
    pub email: String,
    pub company_name: String,
    pub relationship: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason_for_leaving: Option<String>,
    pub address: Option<String>,
    pub position_held: Option<String>,
    pub user_position_held: Option<String>,
    pub user_signature: Option<String>,
}

impl HasEntityId for Referee {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

/// A reference request and, once received, its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub applicant: PartyRef<User>,
    pub referee: PartyRef<Referee>,
    pub created_by: PartyRef<User>,
    pub status: ReferenceStatus,
    pub relationship: Option<String>,
    pub position_held: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason_for_leaving: Option<String>,
    pub salary: Option<String>,
    pub performance: Option<String>,
    pub conduct: Option<String>,
    pub integrity: Option<String>,
    pub additional_comments: Option<String>,
    pub referee_signature: Option<String>,
    pub rejection_reason: Option<String>,
    /// Access token for the public referee form.
    pub token: String,
    pub token_expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl HasEntityId for Reference {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

// =============================================================================
// TESTS
// =============================================================================
