//! Collection schemas as handed to the storage engine.

use crate::document::Document;
use crate::schema::vocab::{CREATED_AT, UPDATED_AT};
use crate::schema::{ScalarKind, StorageField, StorageFields, StorageType};
use serde_json::{Map, Value as Json};
use std::fmt;
use std::sync::Arc;

/// Options for [`Schema::define`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Maintain `createdAt`/`updatedAt` on every write.
    pub timestamps: bool,
}

/// The representation a transform is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationKind {
    /// In-memory JSON map.
    Plain,
    /// JSON text.
    Wire,
}

/// Post-processing of a document's rendered representation.
///
/// `ret` holds the engine's partial rendering of `doc`: identifiers as
/// `{"$oid": ...}`, maps flattened to plain objects. The transform edits it
/// in place.
pub trait Transform: Send + Sync {
    /// Rewrite the rendered representation of `doc`.
    fn apply(&self, doc: &Document, ret: &mut Map<String, Json>);
}

impl<F> Transform for F
where
    F: Fn(&Document, &mut Map<String, Json>) + Send + Sync,
{
    fn apply(&self, doc: &Document, ret: &mut Map<String, Json>) {
        (self)(doc, ret)
    }
}

/// A collection schema: compiled fields, options and representation
/// transforms.
#[derive(Clone)]
pub struct Schema {
    fields: StorageFields,
    options: SchemaOptions,
    expandable: Vec<String>,
    plain: Option<Arc<dyn Transform>>,
    wire: Option<Arc<dyn Transform>>,
}

impl Schema {
    /// Define a schema from compiled fields.
    ///
    /// With `timestamps`, `createdAt` and `updatedAt` number fields are added
    /// unless the fields already declare them.
    pub fn define(mut fields: StorageFields, options: SchemaOptions) -> Self {
        if options.timestamps {
            for name in [CREATED_AT, UPDATED_AT] {
                if !fields.contains(name) {
                    fields.insert(
                        name,
                        StorageField::new(StorageType::Scalar(ScalarKind::Number), false),
                    );
                }
            }
        }

        Self {
            fields,
            options,
            expandable: Vec::new(),
            plain: None,
            wire: None,
        }
    }

    /// Attach a transform to the given representation kinds.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>, kinds: &[RepresentationKind]) -> Self {
        for kind in kinds {
            match kind {
                RepresentationKind::Plain => self.plain = Some(Arc::clone(&transform)),
                RepresentationKind::Wire => self.wire = Some(Arc::clone(&transform)),
            }
        }
        self
    }

    /// Record the fields that may be expanded on load.
    pub fn with_expandable(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expandable = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Compiled fields.
    pub fn fields(&self) -> &StorageFields {
        &self.fields
    }

    /// Schema options.
    pub fn options(&self) -> SchemaOptions {
        self.options
    }

    pub fn timestamps(&self) -> bool {
        self.options.timestamps
    }

    /// Fields that may be expanded on load.
    pub fn expandable(&self) -> &[String] {
        &self.expandable
    }

    /// Transform attached to a representation kind.
    pub fn transform(&self, kind: RepresentationKind) -> Option<&Arc<dyn Transform>> {
        match kind {
            RepresentationKind::Plain => self.plain.as_ref(),
            RepresentationKind::Wire => self.wire.as_ref(),
        }
    }

    /// Render the compiled definition.
    pub fn to_json(&self) -> Json {
        self.fields.to_json()
    }

    /// blake3 fingerprint of the compiled definition and options.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.to_json().to_string().as_bytes());
        hasher.update(&[self.options.timestamps as u8]);
        hasher.finalize().to_hex().to_string()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("options", &self.options)
            .field("expandable", &self.expandable)
            .field("plain_transform", &self.plain.is_some())
            .field("wire_transform", &self.wire.is_some())
            .finish()
    }
}
