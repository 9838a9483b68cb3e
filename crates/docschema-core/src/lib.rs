//! docschema core - type descriptions, schema compilation and entity registration.
//!
//! Descriptions are written with [`schema::vocab`], compiled into storage
//! field definitions by [`schema::compile`], and registered as collections
//! with [`entity::register`]. The [`storage::DocumentStore`] is a sled-backed
//! engine that stores the registered collections.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod document;
pub mod entity;
pub mod error;
pub mod schema;
pub mod storage;

pub use document::{Document, ObjectId, Value};
pub use entity::{register, Registrar, SerializationTransform};
pub use error::Error;
pub use schema::{compile, CompileError, CompileErrorKind, StorageField, StorageFields, StorageType, TypeNode};
pub use storage::{
    CollectionHandle, CollectionStats, DocumentStore, RepresentationKind, Schema, SchemaOptions,
    StorageEngine, StoreConfig, StoreStatus, Transform,
};
