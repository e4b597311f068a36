//! StateStore — redb-backed registration persistence.
//!
//! Registrations are JSON-serialized into redb's `&[u8]` value column and
//! keyed by service id. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::REGISTRATIONS;
use crate::traits::RegistrationStore;
use crate::types::Registration;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Whether a write creates a new key or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Replace,
}

/// Thread-safe registration store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn write_registration(&self, registration: &Registration, mode: WriteMode) -> StateResult<()> {
        let key = registration.service_id.as_str();
        let value = serde_json::to_vec(registration).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
            let exists = table.get(key).map_err(map_err!(Read))?.is_some();
            match (mode, exists) {
                (WriteMode::Insert, true) => {
                    return Err(StateError::AlreadyExists(key.to_string()));
                }
                (WriteMode::Replace, false) => {
                    return Err(StateError::NotFound(key.to_string()));
                }
                _ => {}
            }
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service_id = %key, ?mode, "registration stored");
        Ok(())
    }
}

impl RegistrationStore for StateStore {
    fn add_registration(&self, registration: &Registration) -> StateResult<()> {
        self.write_registration(registration, WriteMode::Insert)
    }

    fn update_registration(&self, registration: &Registration) -> StateResult<()> {
        self.write_registration(registration, WriteMode::Replace)
    }

    fn delete_registration(&self, service_id: &str) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
            existed = table.remove(service_id).map_err(map_err!(Write))?.is_some();
        }
        if !existed {
            txn.abort().map_err(map_err!(Transaction))?;
            return Err(StateError::NotFound(service_id.to_string()));
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%service_id, "registration deleted");
        Ok(())
    }

    fn get_registration(&self, service_id: &str) -> StateResult<Option<Registration>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
        match table.get(service_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let registration: Registration =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(registration))
            }
            None => Ok(None),
        }
    }

    fn list_registrations(&self) -> StateResult<Vec<Registration>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REGISTRATIONS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let registration: Registration =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(registration);
        }
        Ok(results)
    }
}
