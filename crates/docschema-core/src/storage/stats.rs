//! Store and collection status reports.

use serde::Serialize;
use sled::Tree;

use crate::error::Error;

/// State of the store's underlying database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// Opened a fresh database.
    Connected,
    /// Opened a database left by an earlier process.
    Recovered,
}

/// Size and count of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// `<database>.<collection>`.
    pub namespace: String,
    /// Number of documents.
    pub count: usize,
    /// Bytes of stored document JSON.
    pub size: u64,
    /// Bytes of stored keys and documents.
    pub storage_size: u64,
}

impl CollectionStats {
    /// Measure a collection tree.
    pub(crate) fn measure(name: &str, database: &str, tree: &Tree) -> Result<Self, Error> {
        let mut count = 0;
        let mut size = 0u64;
        let mut storage_size = 0u64;
        for item in tree.iter() {
            let (key, value) = item?;
            count += 1;
            size += value.len() as u64;
            storage_size += (key.len() + value.len()) as u64;
        }

        Ok(Self {
            name: name.to_string(),
            namespace: format!("{}.{}", database, name),
            count,
            size,
            storage_size,
        })
    }
}

/// Status of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    /// Database state.
    pub state: ConnectionState,
    /// Database name.
    pub database: String,
    /// Per-collection statistics, sorted by name.
    pub collections: Vec<CollectionStats>,
}

impl StoreStatus {
    /// Statistics for one collection.
    pub fn collection(&self, name: &str) -> Option<&CollectionStats> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Total documents across collections.
    pub fn total_count(&self) -> usize {
        self.collections.iter().map(|c| c.count).sum()
    }
}
