// # Record Store Trait
//
// Defines the interface for the authoritative record state behind a
// (simulated) provider.
//
// Protocol handlers only see this interface; locking is the store's concern.

use async_trait::async_trait;

use crate::records::Records;

/// Trait for record store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Reads may run alongside each other but never alongside a write, so a
/// reader observes either the whole of a `replace` or none of it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get a copy of the records stored under `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Records))`: The stored set (possibly empty)
    /// - `Ok(None)`: Nothing was ever stored under this name
    async fn get(&self, name: &str) -> Result<Option<Records>, crate::Error>;

    /// Store `records` under every name in `names`, in one exclusive section
    async fn replace(&self, names: &[String], records: Records) -> Result<(), crate::Error>;

    /// List every name that has been stored
    async fn known_names(&self) -> Result<Vec<String>, crate::Error>;
}
