//! ParamStore — redb-backed parameter persistence for drowse.
//!
//! Named string values with last-writer-wins `put` semantics. The store
//! supports both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::secret::unwrap_token;
use crate::tables::PARAMS;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe parameter store backed by redb.
#[derive(Clone)]
pub struct ParamStore {
    db: Arc<Database>,
}

impl ParamStore {
    /// Open (or create) a persistent parameter store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "parameter store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory parameter store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory parameter store opened");
        Ok(store)
    }

    /// Create the params table if it doesn't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PARAMS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert or overwrite a named parameter. Last writer wins.
    pub fn put(&self, name: &str, value: &str) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PARAMS).map_err(map_err!(Table))?;
            table.insert(name, value).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "parameter stored");
        Ok(())
    }

    /// Get a parameter by name.
    pub fn get(&self, name: &str) -> StateResult<Option<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PARAMS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(guard.value().to_string())),
            None => Ok(None),
        }
    }

    /// Delete a parameter by name. Returns true if it existed.
    pub fn delete(&self, name: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(PARAMS).map_err(map_err!(Table))?;
            existed = table.remove(name).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, existed, "parameter deleted");
        Ok(existed)
    }

    /// Retrieve a bearer credential by parameter name.
    ///
    /// The stored value is either the raw token or a JSON object wrapping it
    /// in a `token` field; both retrieval paths yield the bare token. An
    /// absent parameter is `None`; a present-but-empty one is an error so
    /// the caller can surface it as actionable.
    pub fn get_secret(&self, name: &str) -> StateResult<Option<String>> {
        match self.get(name)? {
            Some(raw) => match unwrap_token(&raw) {
                Some(token) => Ok(Some(token)),
                None => Err(StateError::EmptySecret(name.to_string())),
            },
            None => Ok(None),
        }
    }
}
