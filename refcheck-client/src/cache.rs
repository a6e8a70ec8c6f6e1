//! Cache store and tag index.
//!
//! Query results are stored normalized, keyed by the canonical form of
//! their descriptor. Entries carry the consistency tags their endpoint
//! provides; invalidating a tag marks every carrying entry stale and
//! schedules exactly one refetch per subscribed entry.
//!
//! Locking discipline: all map mutations happen under a plain mutex that
//! is never held across an await point, so two concurrently resolving
//! fetches for one key can never interleave partial writes.

use crate::gatekeeper::Gatekeeper;
use crate::query::{CacheKey, QueryDescriptor, Tag};
use crate::transport::ApiRequest;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// A fully described read: its identity, the request that fulfils it, and
/// the tags its result carries.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub descriptor: QueryDescriptor,
    pub request: ApiRequest,
    pub provides: Vec<Tag>,
}

/// Where a cache entry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// A fetch is in flight; `data` still holds the previous result, if
    /// any.
    Fetching,
    /// The stored result is current as far as this client knows.
    Fresh,
    /// A matching invalidation has landed; the stored result may be out
    /// of date.
    Stale,
    /// The last fetch failed; `last_error` holds the rendered failure.
    Error,
}

/// What a subscriber sees at subscribe time: the best-known data
/// (possibly stale) and the entry's current status.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data: Option<Value>,
    pub status: EntryStatus,
    pub last_error: Option<String>,
}

struct Entry {
    request: ApiRequest,
    tags: HashSet<Tag>,
    data: Option<Value>,
    status: EntryStatus,
    subscribers: usize,
    /// Bumped on every invalidation. A resolving fetch carrying an older
    /// generation is superseded: its result is discarded and one
    /// follow-up fetch picks up the current generation.
    generation: u64,
    /// Bumped on every subscribe; lets a pending eviction timer detect
    /// that the entry came back into use.
    epoch: u64,
    last_error: Option<String>,
}

impl Entry {
    fn new(spec: &QuerySpec) -> Self {
        Self {
            request: spec.request.clone(),
            tags: spec.provides.iter().cloned().collect(),
            data: None,
            status: EntryStatus::Stale,
            subscribers: 0,
            generation: 0,
            epoch: 0,
            last_error: None,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            status: self.status,
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<CacheKey, Entry>,
    tag_index: HashMap<Tag, HashSet<CacheKey>>,
}

impl State {
    fn index_entry(&mut self, key: &CacheKey, tags: &HashSet<Tag>) {
        for tag in tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    fn unindex_entry(&mut self, key: &CacheKey, tags: &HashSet<Tag>) {
        for tag in tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
    }
}

/// Normalized store of query results plus the tag index that drives
/// invalidation.
pub struct CacheStore {
    gatekeeper: Arc<Gatekeeper>,
    state: Mutex<State>,
    evict_grace: Duration,
}

impl CacheStore {
    pub fn new(gatekeeper: Arc<Gatekeeper>, evict_grace: Duration) -> Self {
        Self {
            gatekeeper,
            state: Mutex::new(State::default()),
            evict_grace,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Subscribe to a query. Increments the entry's subscriber count,
    /// creating it on first subscription, and triggers a fetch when the
    /// entry is new or stale. Returns the best-known data immediately.
    ///
    /// Must be called from within a Tokio runtime: fetches run as spawned
    /// tasks.
    pub fn subscribe(self: &Arc<Self>, spec: &QuerySpec) -> Snapshot {
        let key = spec.descriptor.cache_key();
        let (mut snapshot, needs_fetch) = {
            let mut state = self.lock();
            let created = !state.entries.contains_key(&key);
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(spec));
            entry.subscribers += 1;
            entry.epoch += 1;
            let needs_fetch = entry.status == EntryStatus::Stale;
            let snapshot = entry.snapshot();
            let new_tags = created.then(|| entry.tags.clone());
            if let Some(tags) = new_tags {
                state.index_entry(&key, &tags);
            }
            (snapshot, needs_fetch)
        };
        if needs_fetch {
            snapshot.status = EntryStatus::Fetching;
            self.ensure_fetch(key);
        }
        snapshot
    }

    /// Drop one subscription. At zero subscribers the entry becomes
    /// eligible for eviction once the grace period elapses.
    pub fn unsubscribe(self: &Arc<Self>, descriptor: &QueryDescriptor) {
        let key = descriptor.cache_key();
        let idle_epoch = {
            let mut state = self.lock();
            match state.entries.get_mut(&key) {
                Some(entry) => {
                    entry.subscribers = entry.subscribers.saturating_sub(1);
                    (entry.subscribers == 0).then_some(entry.epoch)
                }
                None => None,
            }
        };
        if let Some(epoch) = idle_epoch {
            let store = Arc::clone(self);
            let grace = self.evict_grace;
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                store.evict_if_idle(&key, epoch);
            });
        }
    }

    /// Mark every entry carrying one of `tags` stale and schedule exactly
    /// one refetch per subscribed entry. Duplicate tags, or several tags
    /// mapping to the same entry, still produce a single refetch.
    pub fn invalidate(self: &Arc<Self>, tags: &[Tag]) {
        let mut to_refetch = Vec::new();
        {
            let mut state = self.lock();
            let mut keys: HashSet<CacheKey> = HashSet::new();
            for tag in tags {
                if let Some(tagged) = state.tag_index.get(tag) {
                    keys.extend(tagged.iter().cloned());
                }
            }
            for key in keys {
                let Some(entry) = state.entries.get_mut(&key) else {
                    continue;
                };
                entry.generation += 1;
                debug!(key = %key, generation = entry.generation, "invalidated");
                match entry.status {
                    // In flight: the resolving fetch sees the newer
                    // generation and triggers its own follow-up.
                    EntryStatus::Fetching => {}
                    _ => {
                        entry.status = EntryStatus::Stale;
                        if entry.subscribers > 0 {
                            to_refetch.push(key);
                        }
                    }
                }
            }
        }
        for key in to_refetch {
            self.ensure_fetch(key);
        }
    }

    /// Non-subscribing read of the entry for `descriptor`.
    pub fn peek(&self, descriptor: &QueryDescriptor) -> Option<Snapshot> {
        let state = self.lock();
        state
            .entries
            .get(&descriptor.cache_key())
            .map(Entry::snapshot)
    }

    /// Number of live entries; used by eviction tests and diagnostics.
    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Start a fetch for `key` unless one is already in flight.
    fn ensure_fetch(self: &Arc<Self>, key: CacheKey) {
        let started = {
            let mut state = self.lock();
            let Some(entry) = state.entries.get_mut(&key) else {
                return;
            };
            if entry.status == EntryStatus::Fetching {
                None
            } else {
                entry.status = EntryStatus::Fetching;
                Some((entry.request.clone(), entry.generation))
            }
        };
        if let Some((request, generation)) = started {
            let store = Arc::clone(self);
            tokio::spawn(async move {
                store.run_fetch(key, request, generation).await;
            });
        }
    }

    async fn run_fetch(self: Arc<Self>, key: CacheKey, request: ApiRequest, generation: u64) {
        let result = self.gatekeeper.dispatch(&request).await;
        let follow_up = {
            let mut state = self.lock();
            let Some(entry) = state.entries.get_mut(&key) else {
                // Evicted while in flight; nothing observes the result.
                return;
            };
            if entry.generation != generation {
                // Superseded by an invalidation that landed mid-flight.
                // The result is discarded, never applied over newer state.
                debug!(key = %key, "fetch superseded");
                entry.status = EntryStatus::Stale;
                entry.subscribers > 0
            } else {
                match result {
                    Ok(response) => {
                        entry.data = Some(response.body);
                        entry.status = EntryStatus::Fresh;
                        entry.last_error = None;
                    }
                    Err(err) => {
                        warn!(key = %key, error = %err, "fetch failed");
                        entry.status = EntryStatus::Error;
                        entry.last_error = Some(err.to_string());
                    }
                }
                false
            }
        };
        if follow_up {
            self.ensure_fetch(key);
        }
    }

    fn evict_if_idle(&self, key: &CacheKey, epoch: u64) {
        let mut state = self.lock();
        let idle = state
            .entries
            .get(key)
            .map(|entry| entry.subscribers == 0 && entry.epoch == epoch)
            .unwrap_or(false);
        if idle {
            debug!(key = %key, "evicting idle cache entry");
            if let Some(entry) = state.entries.remove(key) {
                let tags = entry.tags;
                state.unindex_entry(key, &tags);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Data access for the optimistic update controller
    // ------------------------------------------------------------------------

    /// The entry's current data, or `None` when no entry exists for `key`.
    pub(crate) fn snapshot_data(&self, key: &CacheKey) -> Option<Option<Value>> {
        self.lock().entries.get(key).map(|entry| entry.data.clone())
    }

    /// Overwrite the entry's data, restoring a captured snapshot.
    pub(crate) fn write_data(&self, key: &CacheKey, data: Option<Value>) {
        if let Some(entry) = self.lock().entries.get_mut(key) {
            entry.data = data;
        }
    }

    /// Apply `patch` to the entry's data in place. No-op when the entry is
    /// absent or has never held data.
    pub(crate) fn update_data(&self, key: &CacheKey, patch: impl FnOnce(&mut Value)) {
        if let Some(entry) = self.lock().entries.get_mut(key) {
            if let Some(data) = entry.data.as_mut() {
                patch(data);
            }
        }
    }
}
