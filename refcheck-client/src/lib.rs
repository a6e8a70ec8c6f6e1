//! Data synchronization layer for the refcheck admin client.
//!
//! Every feature of the UI reads and writes through this crate: queries
//! are cached and kept consistent by tag invalidation, mutations may
//! patch the cache optimistically before the server confirms, and all
//! network traffic funnels through a single gatekeeper that attaches
//! credentials and classifies failures.

pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod gatekeeper;
pub mod mutation;
pub mod notify;
pub mod query;
pub mod session;
pub mod transport;
pub mod workflow;

pub use cache::{CacheStore, EntryStatus, QuerySpec, Snapshot};
pub use config::{ClientConfig, ConfigError, RetryConfig};
pub use error::{SyncError, SyncResult};
pub use gatekeeper::{Gatekeeper, CSRF_HEADER};
pub use mutation::{MutationController, MutationSpec, OptimisticPatch};
pub use notify::{Notification, Notifier, QueueNotifier};
pub use query::{CacheKey, QueryDescriptor, Tag, TagId};
pub use session::SessionAuthority;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport, TransportError};
pub use workflow::ReferenceWorkflow;

use refcheck_core::{
    AuditResponse, CreateRefereeRequest, EntityId, ListRefereesRequest, ListReferencesRequest,
    Referee, Reference, ReportKind, SubmitReferenceFormRequest, UpdateRefereeRequest,
    UpdateReferenceRequest,
};
use std::sync::Arc;
use std::time::Duration;

/// The fully wired synchronization stack.
pub struct RefcheckClient {
    session: Arc<SessionAuthority>,
    gatekeeper: Arc<Gatekeeper>,
    store: Arc<CacheStore>,
    controller: Arc<MutationController>,
    references: ReferenceWorkflow,
}

impl RefcheckClient {
    /// Build against the production HTTP transport.
    pub fn new(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, SyncError> {
        let transport = Arc::new(transport::HttpTransport::new(config)?);
        Ok(Self::with_transport(config, transport, notifier))
    }

    /// Build against a custom transport; used by tests and embedding
    /// hosts.
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let session = Arc::new(SessionAuthority::new());
        let gatekeeper = Arc::new(Gatekeeper::new(
            transport,
            Arc::clone(&session),
            notifier,
            config.retry.clone(),
        ));
        let store = Arc::new(CacheStore::new(
            Arc::clone(&gatekeeper),
            Duration::from_millis(config.evict_grace_ms),
        ));
        let controller = Arc::new(MutationController::new(
            Arc::clone(&store),
            Arc::clone(&gatekeeper),
        ));
        let references = ReferenceWorkflow::new(Arc::clone(&store), Arc::clone(&controller));
        Self {
            session,
            gatekeeper,
            store,
            controller,
            references,
        }
    }

    pub fn session(&self) -> &SessionAuthority {
        &self.session
    }

    pub fn gatekeeper(&self) -> &Arc<Gatekeeper> {
        &self.gatekeeper
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn mutations(&self) -> &Arc<MutationController> {
        &self.controller
    }

    /// The reference lifecycle workflow.
    pub fn references(&self) -> &ReferenceWorkflow {
        &self.references
    }

    // ------------------------------------------------------------------------
    // Query conveniences
    // ------------------------------------------------------------------------

    pub fn subscribe(&self, spec: &QuerySpec) -> Snapshot {
        self.store.subscribe(spec)
    }

    pub fn unsubscribe(&self, descriptor: &QueryDescriptor) {
        self.store.unsubscribe(descriptor)
    }

    pub fn invalidate(&self, tags: &[Tag]) {
        self.store.invalidate(tags)
    }

    /// One-shot fetch of the audit diff for a reference.
    pub async fn fetch_audit(&self, id: EntityId) -> Result<AuditResponse, SyncError> {
        let spec = endpoints::reference_audit(id);
        let response = self.gatekeeper.dispatch(&spec.request).await?;
        Ok(response.decode()?)
    }

    /// One-shot fetch of a report.
    pub async fn fetch_report(
        &self,
        kind: ReportKind,
    ) -> Result<refcheck_core::ReportPayload, SyncError> {
        let spec = endpoints::report(kind);
        let response = self.gatekeeper.dispatch(&spec.request).await?;
        Ok(response.decode()?)
    }

    /// Subscription spec for a reference listing.
    pub fn reference_list(&self, filter: &ListReferencesRequest) -> QuerySpec {
        endpoints::reference_list(filter)
    }

    pub fn reference_detail(&self, id: EntityId) -> QuerySpec {
        endpoints::reference_detail(id)
    }

    pub fn referee_list(&self, filter: &ListRefereesRequest) -> QuerySpec {
        endpoints::referee_list(filter)
    }

    pub fn referee_detail(&self, id: EntityId) -> QuerySpec {
        endpoints::referee_detail(id)
    }

    // ------------------------------------------------------------------------
    // Referee CRUD
    // ------------------------------------------------------------------------

    pub async fn create_referee(
        &self,
        payload: &CreateRefereeRequest,
    ) -> Result<Referee, SyncError> {
        let spec = endpoints::create_referee(payload)?;
        let response = self.controller.run(spec).await?;
        Ok(response.decode()?)
    }

    pub async fn update_referee(
        &self,
        id: EntityId,
        payload: &UpdateRefereeRequest,
    ) -> Result<Referee, SyncError> {
        let spec = endpoints::update_referee(id, payload)?;
        let response = self.controller.run(spec).await?;
        Ok(response.decode()?)
    }

    pub async fn delete_referee(&self, id: EntityId) -> Result<(), SyncError> {
        self.controller.run(endpoints::delete_referee(id)).await?;
        Ok(())
    }

    /// Update the editable content of a reference.
    pub async fn update_reference(
        &self,
        id: EntityId,
        payload: &UpdateReferenceRequest,
    ) -> Result<Reference, SyncError> {
        let spec = endpoints::update_reference(id, payload)?;
        let response = self.controller.run(spec).await?;
        Ok(response.decode()?)
    }

    // ------------------------------------------------------------------------
    // Public token-based form access
    // ------------------------------------------------------------------------

    /// Load the reference behind a public form token.
    pub async fn load_reference_form(&self, token: &str) -> Result<Reference, SyncError> {
        let spec = endpoints::reference_form(token);
        let response = self.gatekeeper.dispatch(&spec.request).await?;
        Ok(response.decode()?)
    }

    /// Submit the referee's answers through the public form.
    pub async fn submit_reference_form(
        &self,
        payload: &SubmitReferenceFormRequest,
    ) -> Result<(), SyncError> {
        let spec = endpoints::submit_reference_form(payload)?;
        self.controller.run(spec).await?;
        Ok(())
    }
}
