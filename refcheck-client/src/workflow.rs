//! Reference lifecycle workflow.
//!
//! Transitions are guarded locally: the precondition is checked against
//! the best-known status before any request is constructed, so an invalid
//! transition never reaches the network. Each successful transition
//! invalidates the reference's identity tag and the collection's list
//! tag, refetching every subscribed list and detail view.

use crate::cache::CacheStore;
use crate::endpoints;
use crate::error::SyncError;
use crate::mutation::MutationController;
use refcheck_core::{
    CreateReferenceRequest, EntityId, Reference, ReferenceStatus, Transition, ValidationError,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Drives references through
/// `Pending -> Sent -> Received -> Completed | Rejected`.
pub struct ReferenceWorkflow {
    store: Arc<CacheStore>,
    controller: Arc<MutationController>,
    /// Statuses observed from this client's own mutations; consulted
    /// before the cache so a freshly created reference can transition
    /// before any view has subscribed to it.
    statuses: Mutex<HashMap<EntityId, ReferenceStatus>>,
}

impl ReferenceWorkflow {
    pub fn new(store: Arc<CacheStore>, controller: Arc<MutationController>) -> Self {
        Self {
            store,
            controller,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    fn lock_statuses(&self) -> MutexGuard<'_, HashMap<EntityId, ReferenceStatus>> {
        match self.statuses.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Best-known status of `id`, from this workflow's own record or from
    /// the cached detail entry.
    pub fn current_status(&self, id: EntityId) -> Result<ReferenceStatus, ValidationError> {
        if let Some(status) = self.lock_statuses().get(&id) {
            return Ok(*status);
        }
        let snapshot = self
            .store
            .peek(&endpoints::reference_detail_descriptor(id))
            .ok_or(ValidationError::UnknownReference { id })?;
        let data = snapshot
            .data
            .ok_or(ValidationError::UnknownReference { id })?;
        data.get("status")
            .and_then(|status| status.as_str())
            .and_then(|status| ReferenceStatus::from_str(status).ok())
            .ok_or(ValidationError::UnknownReference { id })
    }

    /// Create a reference; the record starts in `Pending`.
    pub async fn create(&self, payload: &CreateReferenceRequest) -> Result<Reference, SyncError> {
        let spec = endpoints::create_reference(payload)?;
        let response = self.controller.run(spec).await?;
        let reference: Reference = response.decode()?;
        debug!(id = %reference.id, "reference created");
        self.lock_statuses().insert(reference.id, reference.status);
        Ok(reference)
    }

    /// Deliver the request to the referee. Requires `Pending`.
    pub async fn send(&self, id: EntityId) -> Result<Reference, SyncError> {
        self.guard(id, Transition::Send)?;
        self.transition(id, endpoints::send_reference(id)).await
    }

    /// Record the referee's submission. Requires `Sent`.
    pub async fn receive(&self, id: EntityId) -> Result<Reference, SyncError> {
        self.guard(id, Transition::Receive)?;
        self.transition(id, endpoints::receive_reference(id)).await
    }

    /// Sign off a received reference. Requires `Received`.
    pub async fn complete(&self, id: EntityId) -> Result<Reference, SyncError> {
        self.guard(id, Transition::Complete)?;
        self.transition(id, endpoints::complete_reference(id)).await
    }

    /// Decline on the referee's behalf. Requires `Sent` and a non-empty
    /// reason; both are validated before the mutation is constructed.
    pub async fn reject(&self, id: EntityId, reason: &str) -> Result<Reference, SyncError> {
        if reason.trim().is_empty() {
            return Err(ValidationError::MissingRejectionReason.into());
        }
        self.guard(id, Transition::Reject)?;
        self.transition(id, endpoints::reject_reference(id, reason))
            .await
    }

    /// Delete the record. Allowed from any status; invalidates both the
    /// identity tag and the list tag.
    pub async fn delete(&self, id: EntityId) -> Result<(), SyncError> {
        self.controller.run(endpoints::delete_reference(id)).await?;
        self.lock_statuses().remove(&id);
        Ok(())
    }

    fn guard(&self, id: EntityId, transition: Transition) -> Result<(), ValidationError> {
        let current = self.current_status(id)?;
        if !current.can_apply(transition) {
            return Err(ValidationError::InvalidTransition {
                from: current,
                attempted: transition,
            });
        }
        Ok(())
    }

    async fn transition(
        &self,
        id: EntityId,
        spec: crate::mutation::MutationSpec,
    ) -> Result<Reference, SyncError> {
        let response = self.controller.run(spec).await?;
        let reference: Reference = response.decode()?;
        debug!(id = %id, status = %reference.status, "reference transitioned");
        self.lock_statuses().insert(id, reference.status);
        Ok(reference)
    }
}
