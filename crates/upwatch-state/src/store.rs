//! StateStore — redb-backed persistence for upwatch.
//!
//! Provides typed CRUD over the service registry and append/query operations
//! over the status history. All values are JSON-serialized into redb's
//! `&[u8]` value columns. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
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
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.open_table(STATUSES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Service registry ───────────────────────────────────────────

    /// Insert or update a registered service.
    pub fn put_service(&self, spec: &ServiceSpec) -> StateResult<()> {
        let value = serde_json::to_vec(spec).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            table
                .insert(spec.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service_id = %spec.id, name = %spec.name, "service stored");
        Ok(())
    }

    /// Get a service by id.
    pub fn get_service(&self, service_id: &str) -> StateResult<Option<ServiceSpec>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        match table.get(service_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let spec: ServiceSpec =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(spec))
            }
            None => Ok(None),
        }
    }

    /// List all registered services, in table key order.
    ///
    /// The returned `Vec` is an owned snapshot: callers iterating it (a
    /// check-all run, a latest-per-service query) are unaffected by registry
    /// changes made after this call returns.
    pub fn list_services(&self) -> StateResult<Vec<ServiceSpec>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let spec: ServiceSpec =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(spec);
        }
        Ok(results)
    }

    /// Delete a service by id. Returns true if it existed.
    ///
    /// History is untouched: status records for the deleted service remain
    /// queryable by `service_id` filter.
    pub fn delete_service(&self, service_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            existed = table.remove(service_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%service_id, existed, "service deleted");
        Ok(existed)
    }

    // ── Status history ─────────────────────────────────────────────

    /// Append a status record.
    ///
    /// The single write transaction commits the record atomically: readers
    /// see either the whole record or nothing.
    pub fn append_status(&self, record: &StatusRecord) -> StateResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(STATUSES).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// List status records, newest first.
    ///
    /// Filters by `service_id` when given, then applies `offset` and `limit`
    /// to the filtered sequence. The whole query runs on one read-transaction
    /// snapshot, so concurrent appends neither duplicate nor skip records
    /// within a single call.
    pub fn list_statuses(
        &self,
        service_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> StateResult<Vec<StatusRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATUSES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        let mut skipped = 0usize;
        for entry in table.iter().map_err(map_err!(Read))?.rev() {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: StatusRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if let Some(wanted) = service_id {
                if record.service_id != wanted {
                    continue;
                }
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            results.push(record);
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }

    /// Most recent status record for a service, if it has any.
    pub fn latest_status_for(&self, service_id: &str) -> StateResult<Option<StatusRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATUSES).map_err(map_err!(Table))?;
        for entry in table.iter().map_err(map_err!(Read))?.rev() {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: StatusRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if record.service_id == service_id {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Latest record per currently-registered service.
    ///
    /// Follows the registry snapshot's iteration order; services with no
    /// history are omitted rather than represented as gaps.
    pub fn latest_statuses(&self) -> StateResult<Vec<StatusRecord>> {
        let services = self.list_services()?;
        let mut results = Vec::new();
        for service in &services {
            if let Some(record) = self.latest_status_for(&service.id)? {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Count status records, optionally filtered by service id. Ignores
    /// pagination.
    pub fn count_statuses(&self, service_id: Option<&str>) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATUSES).map_err(map_err!(Table))?;
        let mut count = 0u64;
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            match service_id {
                None => count += 1,
                Some(wanted) => {
                    let record: StatusRecord =
                        serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                    if record.service_id == wanted {
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }
}
