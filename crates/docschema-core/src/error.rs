//! Core error types.

use crate::schema::CompileError;
use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Malformed description.
    #[error("malformed schema: {0}")]
    Compile(#[from] CompileError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// A collection name was registered twice.
    #[error("collection '{0}' is already registered")]
    DuplicateRegistration(String),

    /// No collection registered under this name.
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    /// An expandable field that is not a reference field.
    #[error("field '{field}' of '{entity}' is not a reference field")]
    InvalidExpandable {
        /// Entity being registered.
        entity: String,
        /// Offending field.
        field: String,
    },

    /// Schema rejected by the storage engine.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Malformed identifier.
    #[error("invalid object id '{0}'")]
    InvalidObjectId(String),

    /// Document rejected by the collection schema.
    #[error("validation failed for '{collection}' at '{path}': {message}")]
    Validation {
        /// Collection name.
        collection: String,
        /// Field path.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Unique option violated.
    #[error("duplicate value {value} for unique field '{collection}.{field}'")]
    UniqueViolation {
        /// Collection name.
        collection: String,
        /// Unique field.
        field: String,
        /// Conflicting value.
        value: String,
    },
}

impl Error {
    pub(crate) fn validation(
        collection: &str,
        path: &str,
        message: impl Into<String>,
    ) -> Self {
        Error::Validation {
            collection: collection.to_string(),
            path: path.to_string(),
            message: message.into(),
        }
    }
}
