//! Order store boundary.
//!
//! Persisted order metadata keyed by the permanent identifier. Used by the
//! open-order reconciler to rebuild records for orders discovered live at
//! connection time: the snapshot alone cannot supply the owning strategy or
//! instrument reference, so these must come from the store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::shared::{InstrumentId, OrderId, PermId, StrategyId};

/// Errors from order store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored metadata could not be parsed.
    #[error("Store parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Order metadata persisted across gateway sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedOrder {
    /// Session-local order identifier at the time of persistence.
    pub order_id: OrderId,
    /// Instrument the order trades.
    pub instrument: InstrumentId,
    /// Strategy that owns the order.
    pub strategy: StrategyId,
    /// Requested quantity.
    pub size: Decimal,
    /// Trigger price, if any.
    pub price: Option<Decimal>,
    /// Limit price, if any.
    pub price_limit: Option<Decimal>,
}

/// Durable lookup of order metadata by permanent identifier.
pub trait OrderStore: Send + Sync {
    /// Load metadata for a permanent identifier, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns error if stored data exists but cannot be read or parsed.
    fn load(&self, perm_id: PermId) -> Result<Option<PersistedOrder>, StoreError>;

    /// Persist metadata under a permanent identifier, replacing any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns error if the data cannot be written.
    fn save(&self, perm_id: PermId, order: &PersistedOrder) -> Result<(), StoreError>;
}

/// File-backed store: one JSON document per permanent identifier under a
/// configured directory.
#[derive(Debug)]
pub struct FileOrderStore {
    dir: PathBuf,
}

impl FileOrderStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, perm_id: PermId) -> PathBuf {
        self.dir.join(format!("{perm_id}.json"))
    }
}

impl OrderStore for FileOrderStore {
    fn load(&self, perm_id: PermId) -> Result<Option<PersistedOrder>, StoreError> {
        let path = self.path_for(perm_id);
        if !Path::exists(&path) {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, perm_id: PermId, order: &PersistedOrder) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(order)?;
        fs::write(self.path_for(perm_id), content)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<HashMap<PermId, PersistedOrder>>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn load(&self, perm_id: PermId) -> Result<Option<PersistedOrder>, StoreError> {
        Ok(self
            .orders
            .lock()
            .map(|o| o.get(&perm_id).cloned())
            .unwrap_or_default())
    }

    fn save(&self, perm_id: PermId, order: &PersistedOrder) -> Result<(), StoreError> {
        if let Ok(mut orders) = self.orders.lock() {
            orders.insert(perm_id, order.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_persisted() -> PersistedOrder {
        PersistedOrder {
            order_id: OrderId::new(12),
            instrument: InstrumentId::new("AAPL"),
            strategy: StrategyId::new("momentum"),
            size: dec!(100),
            price: None,
            price_limit: Some(dec!(150.00)),
        }
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOrderStore::new(dir.path());
        let order = make_persisted();

        store.save(PermId::new(900_001), &order).unwrap();
        let loaded = store.load(PermId::new(900_001)).unwrap();
        assert_eq!(loaded, Some(order));
    }

    #[test]
    fn file_store_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOrderStore::new(dir.path());
        assert!(store.load(PermId::new(1)).unwrap().is_none());
    }

    #[test]
    fn file_store_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOrderStore::new(dir.path());
        std::fs::write(dir.path().join("7.json"), "{not json").unwrap();

        assert!(matches!(
            store.load(PermId::new(7)),
            Err(StoreError::Parse(_))
        ));
    }

    #[test]
    fn in_memory_store_round_trip() {
        let store = InMemoryOrderStore::new();
        let order = make_persisted();

        assert!(store.load(PermId::new(1)).unwrap().is_none());
        store.save(PermId::new(1), &order).unwrap();
        assert_eq!(store.load(PermId::new(1)).unwrap(), Some(order));
    }
}
