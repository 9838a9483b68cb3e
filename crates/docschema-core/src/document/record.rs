//! Stored documents.

use super::value::{object_id_to_json, Value};
use super::ObjectId;
use crate::error::Error;
use crate::schema::vocab::ID_FIELD;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

/// A document loaded from a collection.
///
/// Besides its fields, a document remembers which reference fields were
/// expanded when it was loaded, together with the raw keys they held.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: ObjectId,
    fields: IndexMap<String, Value>,
    populated: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            fields: IndexMap::new(),
            populated: BTreeMap::new(),
        }
    }

    /// Create a document with the given fields. An `_id` entry is ignored.
    pub fn with_fields(id: ObjectId, fields: IndexMap<String, Value>) -> Self {
        let mut doc = Self::new(id);
        for (name, value) in fields {
            doc.set(name, value);
        }
        doc
    }

    /// Document identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field value. Setting `_id` is ignored.
    ///
    /// Setting an expanded field replaces its raw keys as well.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if name != ID_FIELD {
            self.populated.remove(&name);
            self.fields.insert(name, value.into());
        }
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.populated.remove(name);
        self.fields.shift_remove(name)
    }

    /// Fields in stored order (without `_id`).
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Whether `field` was expanded on load.
    pub fn is_populated(&self, field: &str) -> bool {
        self.populated.contains_key(field)
    }

    /// Names of expanded fields.
    pub fn populated(&self) -> impl Iterator<Item = &str> {
        self.populated.keys().map(String::as_str)
    }

    /// The raw key(s) an expanded field held before it was expanded.
    pub fn populated_keys(&self, field: &str) -> Option<&Value> {
        self.populated.get(field)
    }

    /// Replace a raw reference with its loaded document(s), keeping the
    /// raw value.
    pub(crate) fn set_populated(&mut self, field: &str, value: Value) {
        let raw = self
            .fields
            .insert(field.to_string(), value)
            .unwrap_or(Value::Null);
        self.populated.entry(field.to_string()).or_insert(raw);
    }

    /// Fields in stored form: expanded fields hold their raw keys again.
    pub(crate) fn unpopulated_fields(&self) -> IndexMap<String, Value> {
        let mut fields = self.fields.clone();
        for (name, raw) in &self.populated {
            if let Some(value) = fields.get_mut(name) {
                *value = raw.clone();
            }
        }
        fields
    }

    /// Native JSON rendering: `_id` first, identifiers as `{"$oid": ...}`.
    pub fn to_json(&self) -> Map<String, Json> {
        let mut out = Map::new();
        out.insert(ID_FIELD.to_string(), object_id_to_json(&self.id));
        for (name, value) in &self.fields {
            out.insert(name.clone(), value.to_json());
        }
        out
    }

    /// Read the native JSON rendering. Requires an `_id` identifier.
    pub fn from_json(json: &Json) -> Result<Self, Error> {
        let map = json
            .as_object()
            .ok_or_else(|| Error::Deserialization("document is not an object".into()))?;

        let id = match map.get(ID_FIELD).map(Value::from_json) {
            Some(Value::ObjectId(id)) => id,
            _ => return Err(Error::Deserialization("document has no valid _id".into())),
        };

        let mut doc = Self::new(id);
        for (name, value) in map {
            doc.set(name.as_str(), Value::from_json(value));
        }
        Ok(doc)
    }

    /// Serialize the stored form to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(&self.to_json()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize the stored form from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let json: Json =
            serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))?;
        Self::from_json(&json)
    }
}
