//! Admin console over the allergen store.

use crate::error::{AdminError, Result};
use crate::form::AllergenForm;
use allergen_client::AllergenStore;
use allergen_core::{AllergenId, AllergenRecord, BackendStatus};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct ConsoleState {
    status: BackendStatus,
    records: Vec<AllergenRecord>,
}

/// CRUD façade over an [`AllergenStore`], tracking backend reachability.
pub struct AdminConsole {
    store: Arc<dyn AllergenStore>,
    state: RwLock<ConsoleState>,
}

impl AdminConsole {
    /// Create a console with status `Checking` and no records.
    #[must_use]
    pub fn new(store: Arc<dyn AllergenStore>) -> Self {
        Self {
            store,
            state: RwLock::new(ConsoleState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ConsoleState> {
        self.state.read().expect("acquire console read lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConsoleState> {
        self.state.write().expect("acquire console write lock")
    }

    fn set_status(&self, status: BackendStatus) {
        self.write().status = status;
    }

    /// Probe the store. Any failure counts as disconnected.
    pub async fn check_status(&self) -> BackendStatus {
        self.set_status(BackendStatus::Checking);

        let status = match self.store.list().await {
            Ok(_) => BackendStatus::Connected,
            Err(e) => {
                tracing::warn!(error = %e, "allergen store probe failed");
                BackendStatus::Disconnected
            }
        };
        self.set_status(status);
        tracing::debug!(%status, "backend status checked");
        status
    }

    /// Reload the record list.
    pub async fn refresh(&self) -> Result<usize> {
        match self.store.list().await {
            Ok(records) => {
                let count = records.len();
                let mut state = self.write();
                state.records = records;
                state.status = BackendStatus::Connected;
                tracing::debug!(count, "admin records refreshed");
                Ok(count)
            }
            Err(e) => {
                self.set_status(BackendStatus::Disconnected);
                tracing::warn!(error = %e, "failed to refresh admin records");
                Err(AdminError::client(e, "Backend not reachable"))
            }
        }
    }

    /// Probe the store, then reload the records if it is reachable.
    ///
    /// Returns the number of records, or `Offline` if the probe failed.
    pub async fn sync(&self) -> Result<usize> {
        if self.check_status().await.is_connected() {
            self.refresh().await
        } else {
            Err(AdminError::Offline)
        }
    }

    /// Create a record, or update `editing` if given, then reload the list.
    ///
    /// Refused with `Offline` unless the backend is known to be connected.
    /// A failed reload after the write does not fail the save.
    pub async fn save(
        &self,
        form: &AllergenForm,
        editing: Option<&AllergenId>,
    ) -> Result<AllergenRecord> {
        if !self.status().is_connected() {
            return Err(AdminError::Offline);
        }
        let draft = form.to_draft()?;

        let saved = match editing {
            Some(id) => self.store.update(id, &draft).await,
            None => self.store.create(&draft).await,
        }
        .map_err(|e| AdminError::client(e, "Save failed"))?;

        tracing::info!(
            id = %saved.id,
            name = %saved.name,
            updated = editing.is_some(),
            "allergen saved"
        );
        self.refresh_after_write().await;
        Ok(saved)
    }

    /// Delete a record, then reload the list.
    pub async fn delete(&self, id: &AllergenId) -> Result<()> {
        self.store
            .delete(id)
            .await
            .map_err(|e| AdminError::client(e, "Delete failed"))?;

        tracing::info!(%id, "allergen deleted");
        self.refresh_after_write().await;
        Ok(())
    }

    /// Reload after a write the store accepted. A failed reload keeps the
    /// previous list and marks the backend disconnected; the write still
    /// counts as done.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "record list not reloaded after write");
        }
    }

    /// Current backend status.
    #[must_use]
    pub fn status(&self) -> BackendStatus {
        self.read().status
    }

    /// Records from the last successful refresh.
    #[must_use]
    pub fn records(&self) -> Vec<AllergenRecord> {
        self.read().records.clone()
    }

    /// Look up a loaded record by id.
    #[must_use]
    pub fn find(&self, id: &AllergenId) -> Option<AllergenRecord> {
        self.read().records.iter().find(|r| &r.id == id).cloned()
    }
}
