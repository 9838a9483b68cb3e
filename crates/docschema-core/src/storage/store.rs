//! The sled-backed document store.

use super::catalog::{Catalog, CatalogEntry};
use super::collection::{CollectionHandle, CollectionState};
use super::stats::{CollectionStats, ConnectionState, StoreStatus};
use super::unique_index::UniqueIndex;
use super::validate::compile_patterns;
use super::{Schema, StorageEngine, StoreConfig};
use crate::error::Error;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sled::{Db, Tree};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Prefix of per-collection tree names.
pub const COLLECTION_TREE_PREFIX: &str = "collection:";

/// State shared by the store and every collection handle.
pub(crate) struct StoreInner {
    pub(crate) db: Db,
    pub(crate) database: String,
    pub(crate) catalog: Catalog,
    pub(crate) unique: UniqueIndex,
    pub(crate) collections: DashMap<String, Arc<CollectionState>>,
}

impl StoreInner {
    pub(crate) fn collection_tree(&self, name: &str) -> Result<Tree, Error> {
        Ok(self
            .db
            .open_tree(format!("{}{}", COLLECTION_TREE_PREFIX, name))?)
    }
}

/// Handle to a registered collection by name, sharing `store`.
pub(crate) fn handle(store: &Arc<StoreInner>, name: &str) -> Option<CollectionHandle> {
    store
        .collections
        .get(name)
        .map(|state| CollectionHandle::new(Arc::clone(state.value()), Arc::clone(store)))
}

/// A document store with one sled tree per registered collection.
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

impl DocumentStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let catalog = Catalog::open(&db)?;
        let unique = UniqueIndex::open(&db)?;

        info!(
            path = %config.path.display(),
            database = %config.name,
            recovered = db.was_recovered(),
            known_collections = catalog.len(),
            "document store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                db,
                database: config.name,
                catalog,
                unique,
                collections: DashMap::new(),
            }),
        })
    }

    /// Register a collection. Each name may be registered once per store.
    pub fn register_collection(&self, name: &str, schema: Schema) -> Result<CollectionHandle, Error> {
        if name.is_empty() {
            return Err(Error::InvalidSchema("collection name is empty".into()));
        }
        let patterns = compile_patterns(schema.fields())?;

        match self.inner.collections.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::DuplicateRegistration(name.to_string())),
            Entry::Vacant(slot) => {
                let tree = self.inner.collection_tree(name)?;

                let entry = CatalogEntry::from_schema(name, &schema);
                let fingerprint = entry.fingerprint.clone();
                if let Some(previous) = self.inner.catalog.record(entry)? {
                    if previous.fingerprint != fingerprint {
                        warn!(
                            collection = name,
                            previous = %previous.fingerprint,
                            current = %fingerprint,
                            "collection schema changed since last registration"
                        );
                    }
                }

                let fields = schema.fields().len();
                let state = Arc::new(CollectionState::new(
                    name,
                    &self.inner.database,
                    schema,
                    tree,
                    patterns,
                ));
                slot.insert(Arc::clone(&state));

                info!(collection = name, fields, "collection registered");
                Ok(CollectionHandle::new(state, Arc::clone(&self.inner)))
            }
        }
    }

    /// Handle to a registered collection.
    pub fn collection(&self, name: &str) -> Option<CollectionHandle> {
        handle(&self.inner, name)
    }

    /// Names of collections registered in this process, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Catalog entry of a collection registered now or by an earlier process.
    pub fn catalog_entry(&self, name: &str) -> Option<CatalogEntry> {
        self.inner.catalog.get(name)
    }

    /// Connection state and per-collection statistics.
    ///
    /// Collections known only from the catalog are included.
    pub fn status(&self) -> Result<StoreStatus, Error> {
        let mut names: BTreeSet<String> = self.inner.catalog.names().into_iter().collect();
        names.extend(self.collection_names());

        let collections = names
            .iter()
            .map(|name| {
                let tree = self.inner.collection_tree(name)?;
                CollectionStats::measure(name, &self.inner.database, &tree)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let state = if self.was_recovered() {
            ConnectionState::Recovered
        } else {
            ConnectionState::Connected
        };

        Ok(StoreStatus {
            state,
            database: self.inner.database.clone(),
            collections,
        })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<usize, Error> {
        Ok(self.inner.db.flush()?)
    }

    /// Check if the database existed before it was opened.
    pub fn was_recovered(&self) -> bool {
        self.inner.db.was_recovered()
    }

    /// Database name used in namespaces.
    pub fn database(&self) -> &str {
        &self.inner.database
    }
}

impl StorageEngine for DocumentStore {
    type Handle = CollectionHandle;

    fn register_collection(&self, name: &str, schema: Schema) -> Result<CollectionHandle, Error> {
        DocumentStore::register_collection(self, name, schema)
    }

    fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains_key(name)
    }
}
