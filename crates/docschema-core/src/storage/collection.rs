//! Collection handles: document access, expansion and rendering.

use super::stats::CollectionStats;
use super::store::{handle, StoreInner};
use super::validate::{Patterns, Validator};
use super::{RepresentationKind, Schema};
use crate::document::{current_millis, Document, ObjectId, Value};
use crate::error::Error;
use crate::schema::vocab::{CREATED_AT, ID_FIELD, UPDATED_AT};
use crate::schema::StorageType;
use serde_json::{Map, Value as Json};
use sled::Tree;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Option marking a top-level field as unique.
pub const UNIQUE_OPTION: &str = "unique";

/// Per-collection state owned by the store registry.
pub(crate) struct CollectionState {
    name: String,
    namespace: String,
    schema: Schema,
    tree: Tree,
    patterns: Patterns,
    unique_fields: Vec<String>,
}

impl CollectionState {
    pub(crate) fn new(
        name: &str,
        database: &str,
        schema: Schema,
        tree: Tree,
        patterns: Patterns,
    ) -> Self {
        let unique_fields = schema
            .fields()
            .iter()
            .filter(|(_, field)| {
                field.option(UNIQUE_OPTION).and_then(Json::as_bool) == Some(true)
                    && matches!(field.ty, StorageType::Scalar(_) | StorageType::ObjectId)
            })
            .map(|(name, _)| name.to_string())
            .collect();

        Self {
            name: name.to_string(),
            namespace: format!("{}.{}", database, name),
            schema,
            tree,
            patterns,
            unique_fields,
        }
    }
}

/// Handle to a registered collection.
#[derive(Clone)]
pub struct CollectionHandle {
    state: Arc<CollectionState>,
    store: Arc<StoreInner>,
}

impl CollectionHandle {
    pub(crate) fn new(state: Arc<CollectionState>, store: Arc<StoreInner>) -> Self {
        Self { state, store }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// `<database>.<collection>`.
    pub fn namespace(&self) -> &str {
        &self.state.namespace
    }

    /// The registered schema.
    pub fn schema(&self) -> &Schema {
        &self.state.schema
    }

    /// Insert a new document.
    ///
    /// Values are cast and checked against the schema; the stored document
    /// is returned.
    pub fn insert(&self, doc: Document) -> Result<Document, Error> {
        let id = doc.id();
        if self.state.tree.contains_key(id.bytes())? {
            return Err(Error::UniqueViolation {
                collection: self.state.name.clone(),
                field: ID_FIELD.to_string(),
                value: id.to_hex(),
            });
        }

        let mut fields = doc.unpopulated_fields();
        if self.state.schema.timestamps() {
            let now = Value::from(current_millis());
            fields.insert(CREATED_AT.to_string(), now.clone());
            fields.insert(UPDATED_AT.to_string(), now);
        }
        self.validator().validate(self.state.schema.fields(), &mut fields)?;

        let stored = Document::with_fields(id, fields);
        self.claim_unique(&stored, None)?;
        self.state.tree.insert(id.bytes(), stored.to_bytes()?)?;

        debug!(collection = %self.state.name, id = %id, "document inserted");
        Ok(stored)
    }

    /// Insert a document given as JSON. A missing `_id` is generated.
    pub fn insert_json(&self, json: &Json) -> Result<Document, Error> {
        let map = json
            .as_object()
            .ok_or_else(|| Error::validation(&self.state.name, "", "document is not an object"))?;

        let id = match map.get(ID_FIELD).map(Value::from_json) {
            Some(Value::ObjectId(id)) => id,
            Some(Value::String(hex)) => ObjectId::parse_str(&hex)?,
            _ => ObjectId::new(),
        };

        let mut doc = Document::new(id);
        for (name, value) in map {
            doc.set(name.as_str(), Value::from_json(value));
        }
        self.insert(doc)
    }

    /// Load a document by identifier.
    pub fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, Error> {
        match self.state.tree.get(id.bytes())? {
            Some(bytes) => Ok(Some(Document::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load every document, ordered by identifier.
    pub fn find_all(&self) -> Result<Vec<Document>, Error> {
        self.state
            .tree
            .iter()
            .map(|item| {
                let (_, bytes) = item?;
                Document::from_bytes(&bytes)
            })
            .collect()
    }

    /// Replace a stored document. Returns `None` if it does not exist.
    pub fn update(&self, doc: Document) -> Result<Option<Document>, Error> {
        let id = doc.id();
        let previous = match self.find_by_id(id)? {
            Some(previous) => previous,
            None => return Ok(None),
        };

        let mut fields = doc.unpopulated_fields();
        if self.state.schema.timestamps() {
            let now = Value::from(current_millis());
            let created = previous.get(CREATED_AT).cloned().unwrap_or_else(|| now.clone());
            fields.insert(CREATED_AT.to_string(), created);
            fields.insert(UPDATED_AT.to_string(), now);
        }
        self.validator().validate(self.state.schema.fields(), &mut fields)?;

        let stored = Document::with_fields(id, fields);
        self.claim_unique(&stored, Some(&previous))?;
        self.state.tree.insert(id.bytes(), stored.to_bytes()?)?;

        debug!(collection = %self.state.name, id = %id, "document updated");
        Ok(Some(stored))
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete(&self, id: ObjectId) -> Result<bool, Error> {
        let removed = match self.state.tree.remove(id.bytes())? {
            Some(bytes) => Document::from_bytes(&bytes)?,
            None => return Ok(false),
        };

        for (field, value) in self.unique_values(&removed) {
            self.store
                .unique
                .remove(&self.state.name, &field, &value, id)?;
        }

        debug!(collection = %self.state.name, id = %id, "document deleted");
        Ok(true)
    }

    /// Number of stored documents.
    pub fn count(&self) -> usize {
        self.state.tree.len()
    }

    /// Replace the identifier(s) in reference field `field` with the
    /// referenced document(s).
    ///
    /// A dangling single reference becomes null; dangling entries of a
    /// reference array are dropped. The raw keys are kept and are what
    /// `insert` and `update` store. Populating an expanded field is a no-op.
    pub fn populate(&self, doc: &mut Document, field: &str) -> Result<(), Error> {
        let target = self
            .state
            .schema
            .fields()
            .get(field)
            .and_then(|f| f.reference.clone())
            .ok_or_else(|| Error::validation(&self.state.name, field, "not a reference field"))?;
        let referenced =
            handle(&self.store, &target).ok_or_else(|| Error::UnknownCollection(target.clone()))?;

        if doc.is_populated(field) {
            return Ok(());
        }

        let expanded = match doc.get(field) {
            None | Some(Value::Null) | Some(Value::Document(_)) => return Ok(()),
            Some(Value::ObjectId(id)) => referenced
                .find_by_id(*id)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            Some(Value::Array(items)) => {
                let mut loaded = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::ObjectId(id) => {
                            if let Some(found) = referenced.find_by_id(*id)? {
                                loaded.push(Value::from(found));
                            }
                        }
                        Value::Document(_) => loaded.push(item.clone()),
                        _ => {}
                    }
                }
                Value::Array(loaded)
            }
            Some(other) => {
                return Err(Error::validation(
                    &self.state.name,
                    field,
                    format!("cannot expand {}", other.kind_name()),
                ))
            }
        };

        doc.set_populated(field, expanded);
        Ok(())
    }

    /// Load a document and expand the given reference fields.
    pub fn find_by_id_expanded(&self, id: ObjectId, fields: &[&str]) -> Result<Option<Document>, Error> {
        let mut doc = match self.find_by_id(id)? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        for field in fields {
            self.populate(&mut doc, field)?;
        }
        Ok(Some(doc))
    }

    /// Render as an in-memory JSON map, applying the plain transform.
    pub fn to_plain(&self, doc: &Document) -> Map<String, Json> {
        self.render(doc, RepresentationKind::Plain)
    }

    /// Render as JSON text, applying the wire transform.
    pub fn to_wire(&self, doc: &Document) -> Result<String, Error> {
        let rendered = Json::Object(self.render(doc, RepresentationKind::Wire));
        serde_json::to_string(&rendered).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Count and sizes of this collection.
    pub fn stats(&self) -> Result<CollectionStats, Error> {
        CollectionStats::measure(&self.state.name, &self.store.database, &self.state.tree)
    }

    /// Partial rendering, expanded documents through their own collection,
    /// then this collection's transform.
    fn render(&self, doc: &Document, kind: RepresentationKind) -> Map<String, Json> {
        let mut ret = doc.to_json();

        for field in doc.populated() {
            let referenced = self
                .state
                .schema
                .fields()
                .get(field)
                .and_then(|f| f.reference.as_deref())
                .and_then(|target| handle(&self.store, target));
            if let (Some(referenced), Some(value)) = (referenced, doc.get(field)) {
                ret.insert(field.to_string(), referenced.render_value(value, kind));
            }
        }

        if let Some(transform) = self.state.schema.transform(kind) {
            transform.apply(doc, &mut ret);
        }
        ret
    }

    fn render_value(&self, value: &Value, kind: RepresentationKind) -> Json {
        match value {
            Value::Document(doc) => Json::Object(self.render(doc, kind)),
            Value::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item, kind))
                    .collect(),
            ),
            other => other.to_json(),
        }
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.state.name, &self.state.patterns)
    }

    /// Unique field values of `doc`, as JSON text.
    fn unique_values(&self, doc: &Document) -> Vec<(String, String)> {
        self.state
            .unique_fields
            .iter()
            .filter_map(|field| match doc.get(field) {
                Some(value) if !value.is_null() => Some((field.clone(), value.to_json().to_string())),
                _ => None,
            })
            .collect()
    }

    fn claim_unique(&self, doc: &Document, previous: Option<&Document>) -> Result<(), Error> {
        let values = self.unique_values(doc);
        for (field, value) in &values {
            self.store
                .unique
                .check(&self.state.name, field, value, doc.id())?;
        }

        if let Some(previous) = previous {
            for (field, value) in self.unique_values(previous) {
                if !values.contains(&(field.clone(), value.clone())) {
                    self.store
                        .unique
                        .remove(&self.state.name, &field, &value, doc.id())?;
                }
            }
        }

        for (field, value) in &values {
            self.store
                .unique
                .insert(&self.state.name, field, value, doc.id())?;
        }
        Ok(())
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.state.name)
            .field("namespace", &self.state.namespace)
            .finish()
    }
}
