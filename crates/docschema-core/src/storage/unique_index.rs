//! Secondary index for fields declared `unique: true`.

use crate::document::ObjectId;
use crate::error::Error;
use sled::Tree;

/// Tree name for the unique index.
pub const UNIQUE_INDEX_TREE: &str = "index:unique";

/// Maps unique field values to the owning document.
///
/// Key format: `collection\0field\0value` -> ObjectId bytes
pub struct UniqueIndex {
    tree: Tree,
}

impl UniqueIndex {
    /// Open or create the unique index from a sled database.
    pub fn open(db: &sled::Db) -> Result<Self, Error> {
        let tree = db.open_tree(UNIQUE_INDEX_TREE)?;
        Ok(Self { tree })
    }

    fn build_key(collection: &str, field: &str, value: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(collection.len() + field.len() + value.len() + 2);
        key.extend_from_slice(collection.as_bytes());
        key.push(0);
        key.extend_from_slice(field.as_bytes());
        key.push(0);
        key.extend_from_slice(value.as_bytes());
        key
    }

    /// Look up the document owning a unique value.
    pub fn lookup(&self, collection: &str, field: &str, value: &str) -> Result<Option<ObjectId>, Error> {
        let key = Self::build_key(collection, field, value);
        Ok(self
            .tree
            .get(key)?
            .and_then(|bytes| ObjectId::from_slice(&bytes)))
    }

    /// Fail if `value` is owned by a document other than `id`.
    pub fn check(&self, collection: &str, field: &str, value: &str, id: ObjectId) -> Result<(), Error> {
        match self.lookup(collection, field, value)? {
            Some(owner) if owner != id => Err(Error::UniqueViolation {
                collection: collection.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Claim `value` for `id`.
    pub fn insert(&self, collection: &str, field: &str, value: &str, id: ObjectId) -> Result<(), Error> {
        self.check(collection, field, value, id)?;
        let key = Self::build_key(collection, field, value);
        self.tree.insert(key, &id.bytes()[..])?;
        Ok(())
    }

    /// Release `value` if it is owned by `id`.
    pub fn remove(&self, collection: &str, field: &str, value: &str, id: ObjectId) -> Result<(), Error> {
        let key = Self::build_key(collection, field, value);
        if let Some(bytes) = self.tree.get(&key)? {
            if ObjectId::from_slice(&bytes) == Some(id) {
                self.tree.remove(key)?;
            }
        }
        Ok(())
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
