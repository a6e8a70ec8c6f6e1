//! API Request and Response Types
//!
//! Payloads exchanged with the refcheck server. Field names follow the
//! server's camelCase JSON convention.

use crate::audit::FieldComparison;
use crate::entities::{Referee, Reference};
use crate::enums::ReferenceStatus;
use crate::EntityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// REFERENCE TYPES
// ============================================================================

/// Details for a referee created inline with a reference request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRefereeDetails {
    pub name: String,
    pub email: String,
    pub company_name: String,
    pub relationship: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub position_held: Option<String>,
}

/// The referee half of a create request: either an existing record or
/// inline details, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefereeSource {
    #[serde(rename_all = "camelCase")]
    Existing { referee_id: EntityId },
    #[serde(rename_all = "camelCase")]
    Details { referee_details: NewRefereeDetails },
}

/// Request to create a new reference. The created record starts in
/// `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReferenceRequest {
    pub applicant_id: EntityId,
    #[serde(flatten)]
    pub referee: RefereeSource,
    pub relationship: Option<String>,
    pub position_held: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason_for_leaving: Option<String>,
}

/// Request to update the editable content of a reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReferenceRequest {
    pub relationship: Option<String>,
    pub position_held: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason_for_leaving: Option<String>,
    pub additional_comments: Option<String>,
}

/// Filters for listing references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReferencesRequest {
    pub applicant_id: Option<EntityId>,
    pub referee_id: Option<EntityId>,
    pub status: Option<ReferenceStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListReferencesRequest {
    /// Flatten the populated filters into query parameters.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(applicant_id) = self.applicant_id {
            query.push(("applicantId".to_string(), applicant_id.to_string()));
        }
        if let Some(referee_id) = self.referee_id {
            query.push(("refereeId".to_string(), referee_id.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// Paginated reference listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReferencesResponse {
    pub references: Vec<Reference>,
    /// Total count before pagination.
    pub total: i64,
}

/// Response of the audit endpoint: the per-field diff between the referee
/// record and the reference content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub reference_id: EntityId,
    pub referee_id: EntityId,
    pub comparison: BTreeMap<String, FieldComparison>,
}

/// The referee's submission through the public token-based form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReferenceFormRequest {
    pub token: String,
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
}

// ============================================================================
// REFEREE TYPES
// ============================================================================

/// Request to create a referee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRefereeRequest {
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

/// Request to update a referee record. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRefereeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub relationship: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason_for_leaving: Option<String>,
    pub address: Option<String>,
    pub position_held: Option<String>,
    pub user_position_held: Option<String>,
    pub user_signature: Option<String>,
}

/// Filters for listing referees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRefereesRequest {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListRefereesRequest {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// Paginated referee listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRefereesResponse {
    pub referees: Vec<Referee>,
    pub total: i64,
}

// =============================================================================
// TESTS
// =============================================================================
