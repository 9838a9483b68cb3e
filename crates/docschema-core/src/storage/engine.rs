//! The storage engine seam used by the registrar.

use super::Schema;
use crate::error::Error;

/// A storage engine that turns schemas into collection handles.
pub trait StorageEngine {
    /// Handle used for data access on a registered collection.
    type Handle;

    /// Register a collection under a unique name.
    ///
    /// Registering a name twice fails with [`Error::DuplicateRegistration`].
    fn register_collection(&self, name: &str, schema: Schema) -> Result<Self::Handle, Error>;

    /// Whether a collection is already registered under `name`.
    fn has_collection(&self, name: &str) -> bool;
}
