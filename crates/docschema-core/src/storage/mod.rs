//! Storage layer: schemas, the engine seam and the sled-backed document store.
//!
//! Each registered collection lives in its own sled tree (`collection:<name>`)
//! keyed by identifier bytes, with documents stored as JSON. A catalog tree
//! records every registered schema, and a unique index tree backs fields
//! declared `unique: true`.

mod catalog;
mod collection;
mod config;
mod engine;
mod schema;
mod stats;
mod store;
mod unique_index;
mod validate;

pub use catalog::{Catalog, CatalogEntry};
pub use collection::{CollectionHandle, UNIQUE_OPTION};
pub use config::{StoreConfig, DEFAULT_DATABASE_NAME};
pub use engine::StorageEngine;
pub use schema::{RepresentationKind, Schema, SchemaOptions, Transform};
pub use stats::{CollectionStats, ConnectionState, StoreStatus};
pub use store::{DocumentStore, COLLECTION_TREE_PREFIX};
pub use unique_index::{UniqueIndex, UNIQUE_INDEX_TREE};
pub use validate::{DEFAULT_OPTION, MATCH_OPTION};
