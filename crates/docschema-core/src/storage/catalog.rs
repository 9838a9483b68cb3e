//! Persistent record of registered collections.

use super::Schema;
use crate::document::current_millis;
use crate::error::Error;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sled::{Db, Tree};
use std::collections::BTreeMap;

/// Tree name for collection entries.
const COLLECTIONS_TREE: &str = "catalog:collections";

/// What the catalog remembers about a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Collection name.
    pub name: String,
    /// Compiled definition.
    pub schema: Json,
    /// Fields that may be expanded on load.
    pub expandable: Vec<String>,
    /// Whether timestamps are maintained.
    pub timestamps: bool,
    /// blake3 fingerprint of the definition.
    pub fingerprint: String,
    /// Milliseconds since epoch of the last registration.
    pub registered_at: u64,
}

impl CatalogEntry {
    /// Describe a schema registered under `name` now.
    pub fn from_schema(name: &str, schema: &Schema) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_json(),
            expandable: schema.expandable().to_vec(),
            timestamps: schema.timestamps(),
            fingerprint: schema.fingerprint(),
            registered_at: current_millis(),
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// The catalog of collections, cached in memory.
pub struct Catalog {
    tree: Tree,
    entries: RwLock<BTreeMap<String, CatalogEntry>>,
}

impl Catalog {
    /// Open or create the catalog and load its entries.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let tree = db.open_tree(COLLECTIONS_TREE)?;

        let mut entries = BTreeMap::new();
        for item in tree.iter() {
            let (_, bytes) = item?;
            let entry = CatalogEntry::from_bytes(&bytes)?;
            entries.insert(entry.name.clone(), entry);
        }

        Ok(Self {
            tree,
            entries: RwLock::new(entries),
        })
    }

    /// Store an entry, returning the one it replaces.
    pub fn record(&self, entry: CatalogEntry) -> Result<Option<CatalogEntry>, Error> {
        self.tree.insert(entry.name.as_bytes(), entry.to_bytes()?)?;
        Ok(self.entries.write().insert(entry.name.clone(), entry))
    }

    /// Get an entry by collection name.
    pub fn get(&self, name: &str) -> Option<CatalogEntry> {
        self.entries.read().get(name).cloned()
    }

    /// Names of all recorded collections, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Flush the catalog to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.tree.flush()?;
        Ok(())
    }
}
