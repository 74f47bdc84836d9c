// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Holds the per-domain record sets of the simulated provider. Nothing is
// persisted: state lives exactly as long as the process.
//
// ## Locking
//
// A single RwLock guards every domain. Writes are one per challenge, so
// per-domain locking would buy nothing, and a single lock gives the HTTP and
// DNS surfaces read-your-writes consistency for free.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::records::Records;
use crate::traits::record_store::RecordStore;

/// In-memory record store implementation
///
/// # Example
///
/// ```rust,no_run
/// use acme_dns_core::records::Records;
/// use acme_dns_core::state::MemoryRecordStore;
/// use acme_dns_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     store
///         .replace(&["example.com".to_string()], Records::new().with_txt("xyz"))
///         .await?;
///
///     let records = store.get("example.com").await?;
///     assert_eq!(records.unwrap().first_txt_value(), Some("xyz"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<HashMap<String, Records>>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of names in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, name: &str) -> Result<Option<Records>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(name).cloned())
    }

    async fn replace(&self, names: &[String], records: Records) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        for name in names {
            guard.insert(name.clone(), records.clone());
        }
        Ok(())
    }

    async fn known_names(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }
}
