//! Allergen catalog.
//!
//! Holds the most recent snapshot of allergen records fetched from the
//! store, together with the reachability status of the last load. Readers
//! get a shared `Arc<[AllergenRecord]>`; a load swaps in a new one and never
//! edits a snapshot that has been handed out.

use crate::error::{Backend, Precondition, Result, ScanError};
use allergen_client::AllergenStore;
use allergen_core::{AllergenId, AllergenRecord, BackendStatus, Selection};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct CatalogState {
    snapshot: Arc<[AllergenRecord]>,
    status: BackendStatus,
    last_error: Option<String>,
    /// Incremented when a load starts; only the newest load may apply
    generation: u64,
}

/// Read-mostly cache of the allergen store.
pub struct AllergenCatalog {
    store: Arc<dyn AllergenStore>,
    state: RwLock<CatalogState>,
}

impl AllergenCatalog {
    /// Create an empty catalog backed by `store`. Status starts as `Checking`.
    #[must_use]
    pub fn new(store: Arc<dyn AllergenStore>) -> Self {
        Self {
            store,
            state: RwLock::new(CatalogState {
                snapshot: Arc::from(Vec::new()),
                status: BackendStatus::Checking,
                last_error: None,
                generation: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().expect("acquire catalog read lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().expect("acquire catalog write lock")
    }

    /// Fetch a fresh snapshot from the store.
    ///
    /// On failure the status becomes `Disconnected` and the previous snapshot
    /// (possibly empty) stays in place. If another load starts before this one
    /// finishes, this one's outcome is not applied.
    ///
    /// Returns the number of records in the loaded snapshot.
    pub async fn load(&self) -> Result<usize> {
        let generation = {
            let mut state = self.write();
            state.generation += 1;
            state.status = BackendStatus::Checking;
            state.generation
        };

        tracing::debug!(generation, "loading allergen catalog");
        let outcome = self.store.list().await;

        let mut state = self.write();
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "discarding superseded catalog load"
            );
            return outcome
                .map(|records| records.len())
                .map_err(|e| ScanError::from_store_failure(&e));
        }

        match outcome {
            Ok(records) => {
                let records = dedup_by_id(records);
                let count = records.len();
                state.snapshot = Arc::from(records);
                state.status = BackendStatus::Connected;
                state.last_error = None;
                tracing::info!(count, "allergen catalog loaded");
                Ok(count)
            }
            Err(e) => {
                let err = ScanError::from_store_failure(&e);
                state.status = BackendStatus::Disconnected;
                state.last_error = Some(e.to_string());
                tracing::warn!(
                    error = %e,
                    kept = state.snapshot.len(),
                    "allergen catalog load failed"
                );
                Err(err)
            }
        }
    }

    /// Return `selection` with `id` toggled.
    ///
    /// Fails with `UnknownAllergen` if `id` is not in the current snapshot;
    /// the caller's selection is left as it was.
    pub fn toggle(&self, selection: &Selection, id: &AllergenId) -> Result<Selection> {
        if !self.contains(id) {
            return Err(Precondition::UnknownAllergen(id.clone()).into());
        }
        Ok(selection.toggled(id))
    }

    /// Check that the catalog can be used to start a scan.
    pub fn ensure_ready(&self) -> Result<()> {
        let state = self.read();
        match state.status {
            BackendStatus::Connected => Ok(()),
            BackendStatus::Checking => Err(Precondition::CatalogLoading.into()),
            BackendStatus::Disconnected => Err(ScanError::Connectivity {
                backend: Backend::AllergenStore,
                message: state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "allergen store unavailable".to_string()),
            }),
        }
    }

    /// Current snapshot, in store order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[AllergenRecord]> {
        Arc::clone(&self.read().snapshot)
    }

    /// Status of the most recent load.
    #[must_use]
    pub fn status(&self) -> BackendStatus {
        self.read().status
    }

    /// Message from the most recent failed load, cleared by a successful one.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    /// Number of records in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().snapshot.len()
    }

    /// Whether the current snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().snapshot.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn find(&self, id: &AllergenId) -> Option<AllergenRecord> {
        self.read().snapshot.iter().find(|r| &r.id == id).cloned()
    }

    /// Whether `id` is in the current snapshot.
    #[must_use]
    pub fn contains(&self, id: &AllergenId) -> bool {
        self.read().snapshot.iter().any(|r| &r.id == id)
    }
}

/// Keep the first record for each id.
fn dedup_by_id(records: Vec<AllergenRecord>) -> Vec<AllergenRecord> {
    let mut seen = HashSet::new();
    let before = records.len();
    let unique: Vec<AllergenRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();

    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "allergen store returned duplicate ids"
        );
    }
    unique
}
