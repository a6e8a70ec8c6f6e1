//! Mutations and the optimistic update controller.
//!
//! A mutation may carry an optimistic patch: a speculative edit applied to
//! the affected cache entries before the network call resolves. The
//! controller captures each touched entry's prior data as the undo patch,
//! commits on success (the subsequent tag invalidation reconciles state
//! against the server), and rolls back on failure.
//!
//! Patches stack in call order and unwind in strict LIFO order: rolling
//! back one patch restores its captured snapshots and re-applies every
//! patch that was layered on top of it, so a failure never clobbers the
//! effect of a mutation that is still pending or already committed.

use crate::cache::CacheStore;
use crate::error::SyncError;
use crate::gatekeeper::Gatekeeper;
use crate::query::{CacheKey, QueryDescriptor, Tag};
use crate::transport::{ApiRequest, ApiResponse};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A speculative cache edit applied before the mutation resolves.
#[derive(Clone)]
pub struct OptimisticPatch {
    /// Queries whose cached data the patch touches.
    pub targets: Vec<QueryDescriptor>,
    /// Applied to each target's cached data in call order.
    pub apply: Arc<dyn Fn(&mut Value) + Send + Sync>,
}

impl std::fmt::Debug for OptimisticPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticPatch")
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

/// A fully described write: the request, the tags it invalidates on
/// success, and an optional optimistic patch.
#[derive(Debug, Clone)]
pub struct MutationSpec {
    pub request: ApiRequest,
    pub invalidates: Vec<Tag>,
    pub optimistic: Option<OptimisticPatch>,
}

struct AppliedPatch {
    id: u64,
    patch: OptimisticPatch,
    /// Prior data of each touched entry, captured before the patch ran.
    snapshots: Vec<(CacheKey, Option<Value>)>,
}

/// Runs mutations: optimistic patch, dispatch, then commit-and-invalidate
/// or rollback.
pub struct MutationController {
    store: Arc<CacheStore>,
    gatekeeper: Arc<Gatekeeper>,
    applied: Mutex<Vec<AppliedPatch>>,
    next_patch_id: AtomicU64,
}

impl MutationController {
    pub fn new(store: Arc<CacheStore>, gatekeeper: Arc<Gatekeeper>) -> Self {
        Self {
            store,
            gatekeeper,
            applied: Mutex::new(Vec::new()),
            next_patch_id: AtomicU64::new(1),
        }
    }

    /// Execute one mutation end to end.
    ///
    /// On success the undo patch is discarded and the declared tags are
    /// invalidated; on failure every entry the patch touched is restored
    /// to its exact pre-patch data and the failure propagates unchanged
    /// (the gatekeeper has already raised the user notice).
    pub async fn run(&self, spec: MutationSpec) -> Result<ApiResponse, SyncError> {
        let patch_id = spec.optimistic.as_ref().map(|patch| self.apply_patch(patch));

        let result = self.gatekeeper.dispatch(&spec.request).await;
        match result {
            Ok(response) => {
                if let Some(id) = patch_id {
                    self.commit(id);
                }
                self.store.invalidate(&spec.invalidates);
                Ok(response)
            }
            Err(err) => {
                if let Some(id) = patch_id {
                    self.rollback(id);
                }
                Err(err)
            }
        }
    }

    fn lock_applied(&self) -> MutexGuard<'_, Vec<AppliedPatch>> {
        match self.applied.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Apply a patch to every target the cache currently holds, capturing
    /// each entry's prior data first. Targets with no cache entry are
    /// skipped: there is nothing to patch or to restore.
    fn apply_patch(&self, patch: &OptimisticPatch) -> u64 {
        let id = self.next_patch_id.fetch_add(1, Ordering::Relaxed);
        let snapshots = self.capture_and_apply(patch);
        debug!(patch = id, entries = snapshots.len(), "optimistic patch applied");
        self.lock_applied().push(AppliedPatch {
            id,
            patch: patch.clone(),
            snapshots,
        });
        id
    }

    fn capture_and_apply(&self, patch: &OptimisticPatch) -> Vec<(CacheKey, Option<Value>)> {
        let mut snapshots = Vec::new();
        for target in &patch.targets {
            let key = target.cache_key();
            if let Some(prior) = self.store.snapshot_data(&key) {
                self.store.update_data(&key, |data| (patch.apply)(data));
                snapshots.push((key, prior));
            }
        }
        snapshots
    }

    /// The mutation succeeded; the authoritative response plus the tag
    /// invalidation reconcile state, so the undo patch is dropped.
    fn commit(&self, id: u64) {
        self.lock_applied().retain(|applied| applied.id != id);
    }

    /// Restore the failed patch's snapshots, then re-apply every patch
    /// that was layered on top of it (recapturing their snapshots against
    /// the restored base).
    fn rollback(&self, id: u64) {
        let mut applied = self.lock_applied();
        let Some(position) = applied.iter().position(|p| p.id == id) else {
            return;
        };
        let later = applied.split_off(position + 1);
        if let Some(failed) = applied.pop() {
            debug!(patch = failed.id, "rolling back optimistic patch");
            for (key, prior) in failed.snapshots.into_iter().rev() {
                self.store.write_data(&key, prior);
            }
        }
        for entry in later {
            let snapshots = self.capture_and_apply(&entry.patch);
            applied.push(AppliedPatch {
                id: entry.id,
                patch: entry.patch,
                snapshots,
            });
        }
    }
}
