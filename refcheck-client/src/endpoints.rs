//! Per-entity endpoint definitions.
//!
//! One constructor per route, pairing the HTTP request with the cache
//! identity it provides or the tags it invalidates. The base path `/api`
//! is part of the client's configured base URL, not repeated here.

use crate::cache::QuerySpec;
use crate::mutation::{MutationSpec, OptimisticPatch};
use crate::query::{kinds, QueryDescriptor, Tag};
use crate::transport::ApiRequest;
use refcheck_core::{
    CreateRefereeRequest, CreateReferenceRequest, EntityId, ListRefereesRequest,
    ListReferencesRequest, ReferenceStatus, ReportKind, SubmitReferenceFormRequest,
    UpdateRefereeRequest, UpdateReferenceRequest,
};
use serde_json::{json, Value};
use std::sync::Arc;

// ============================================================================
// REFERENCES
// ============================================================================

pub fn reference_detail(id: EntityId) -> QuerySpec {
    QuerySpec {
        descriptor: reference_detail_descriptor(id),
        request: ApiRequest::get(format!("/references/{id}")),
        provides: vec![Tag::id(kinds::REFERENCE, id)],
    }
}

/// Descriptor for a reference detail query; shared by the workflow's
/// local status guard and by optimistic patches targeting the entry.
pub fn reference_detail_descriptor(id: EntityId) -> QueryDescriptor {
    QueryDescriptor::new("referenceDetail").arg("id", id)
}

pub fn reference_list(filter: &ListReferencesRequest) -> QuerySpec {
    let mut descriptor = QueryDescriptor::new("referenceList");
    let mut request = ApiRequest::get("/references");
    for (key, value) in filter.to_query() {
        descriptor = descriptor.arg(key.clone(), &value);
        request = request.with_query(key, value);
    }
    QuerySpec {
        descriptor,
        request,
        provides: vec![Tag::list(kinds::REFERENCE)],
    }
}

pub fn reference_audit(id: EntityId) -> QuerySpec {
    QuerySpec {
        descriptor: QueryDescriptor::new("referenceAudit").arg("id", id),
        request: ApiRequest::get(format!("/references/{id}/audit")),
        provides: vec![Tag::id(kinds::REFERENCE, id)],
    }
}

/// Public token-based form view. Unauthenticated; carries no cache tags
/// because nothing invalidates it from this client.
pub fn reference_form(token: &str) -> QuerySpec {
    QuerySpec {
        descriptor: QueryDescriptor::new("referenceForm").arg("token", token),
        request: ApiRequest::get("/references/form").with_query("token", token),
        provides: Vec::new(),
    }
}

pub fn create_reference(
    payload: &CreateReferenceRequest,
) -> Result<MutationSpec, serde_json::Error> {
    Ok(MutationSpec {
        request: ApiRequest::post("/references", Some(serde_json::to_value(payload)?)),
        invalidates: vec![Tag::list(kinds::REFERENCE)],
        optimistic: None,
    })
}

pub fn update_reference(
    id: EntityId,
    payload: &UpdateReferenceRequest,
) -> Result<MutationSpec, serde_json::Error> {
    Ok(MutationSpec {
        request: ApiRequest::put(
            format!("/references/{id}"),
            Some(serde_json::to_value(payload)?),
        ),
        invalidates: reference_tags(id),
        optimistic: None,
    })
}

pub fn delete_reference(id: EntityId) -> MutationSpec {
    MutationSpec {
        request: ApiRequest::delete(format!("/references/{id}")),
        invalidates: reference_tags(id),
        optimistic: None,
    }
}

pub fn send_reference(id: EntityId) -> MutationSpec {
    transition_mutation(id, "send", None, ReferenceStatus::Sent)
}

pub fn receive_reference(id: EntityId) -> MutationSpec {
    transition_mutation(id, "receive", None, ReferenceStatus::Received)
}

pub fn complete_reference(id: EntityId) -> MutationSpec {
    transition_mutation(id, "complete", None, ReferenceStatus::Completed)
}

pub fn reject_reference(id: EntityId, reason: &str) -> MutationSpec {
    let body = json!({ "rejectionReason": reason });
    let reason = reason.to_string();
    let mut spec = transition_mutation(id, "reject", Some(body), ReferenceStatus::Rejected);
    if let Some(optimistic) = spec.optimistic.take() {
        let base = optimistic.apply;
        spec.optimistic = Some(OptimisticPatch {
            targets: optimistic.targets,
            apply: Arc::new(move |data| {
                base(data);
                if let Some(object) = data.as_object_mut() {
                    object.insert("rejectionReason".to_string(), Value::String(reason.clone()));
                }
            }),
        });
    }
    spec
}

pub fn submit_reference_form(
    payload: &SubmitReferenceFormRequest,
) -> Result<MutationSpec, serde_json::Error> {
    Ok(MutationSpec {
        request: ApiRequest::post("/references/form", Some(serde_json::to_value(payload)?)),
        invalidates: vec![Tag::list(kinds::REFERENCE)],
        optimistic: None,
    })
}

fn transition_mutation(
    id: EntityId,
    action: &str,
    body: Option<Value>,
    next: ReferenceStatus,
) -> MutationSpec {
    MutationSpec {
        request: ApiRequest::post(format!("/references/{id}/{action}"), body),
        invalidates: reference_tags(id),
        optimistic: Some(status_patch(id, next)),
    }
}

fn reference_tags(id: EntityId) -> Vec<Tag> {
    vec![Tag::id(kinds::REFERENCE, id), Tag::list(kinds::REFERENCE)]
}

/// Speculatively move the cached detail record to `status` while the
/// transition is in flight.
fn status_patch(id: EntityId, status: ReferenceStatus) -> OptimisticPatch {
    OptimisticPatch {
        targets: vec![reference_detail_descriptor(id)],
        apply: Arc::new(move |data| {
            if let Some(object) = data.as_object_mut() {
                object.insert(
                    "status".to_string(),
                    Value::String(status.as_str().to_string()),
                );
            }
        }),
    }
}

// ============================================================================
// REFEREES
// ============================================================================

pub fn referee_detail(id: EntityId) -> QuerySpec {
    QuerySpec {
        descriptor: QueryDescriptor::new("refereeDetail").arg("id", id),
        request: ApiRequest::get(format!("/referees/{id}")),
        provides: vec![Tag::id(kinds::REFEREE, id)],
    }
}

pub fn referee_list(filter: &ListRefereesRequest) -> QuerySpec {
    let mut descriptor = QueryDescriptor::new("refereeList");
    let mut request = ApiRequest::get("/referees");
    for (key, value) in filter.to_query() {
        descriptor = descriptor.arg(key.clone(), &value);
        request = request.with_query(key, value);
    }
    QuerySpec {
        descriptor,
        request,
        provides: vec![Tag::list(kinds::REFEREE)],
    }
}

pub fn create_referee(payload: &CreateRefereeRequest) -> Result<MutationSpec, serde_json::Error> {
    Ok(MutationSpec {
        request: ApiRequest::post("/referees", Some(serde_json::to_value(payload)?)),
        invalidates: vec![Tag::list(kinds::REFEREE)],
        optimistic: None,
    })
}

pub fn update_referee(
    id: EntityId,
    payload: &UpdateRefereeRequest,
) -> Result<MutationSpec, serde_json::Error> {
    Ok(MutationSpec {
        request: ApiRequest::put(
            format!("/referees/{id}"),
            Some(serde_json::to_value(payload)?),
        ),
        invalidates: vec![Tag::id(kinds::REFEREE, id), Tag::list(kinds::REFEREE)],
        optimistic: None,
    })
}

pub fn delete_referee(id: EntityId) -> MutationSpec {
    MutationSpec {
        request: ApiRequest::delete(format!("/referees/{id}")),
        invalidates: vec![Tag::id(kinds::REFEREE, id), Tag::list(kinds::REFEREE)],
        optimistic: None,
    }
}

// ============================================================================
// REPORTS
// ============================================================================

pub fn report(kind: ReportKind) -> QuerySpec {
    QuerySpec {
        descriptor: QueryDescriptor::new("report").arg("kind", kind.as_str()),
        request: ApiRequest::get(format!("/reports/{}", kind.as_str())),
        provides: vec![Tag::id(kinds::REPORT, kind.as_str())],
    }
}

// =============================================================================
// TESTS
// =============================================================================
