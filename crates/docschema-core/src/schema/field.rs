//! Compiled storage fields.

use super::node::{Options, ScalarKind};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// The storage type of a compiled field.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageType {
    /// A scalar value.
    Scalar(ScalarKind),
    /// A native document identifier.
    ObjectId,
    /// A nested sub-document.
    Nested(StorageFields),
    /// A one-element sequence wrapping the element type.
    Array(Box<StorageType>),
    /// A string-keyed map; `of` describes every value.
    Map(Box<StorageField>),
}

impl StorageType {
    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, StorageType::Array(_))
    }

    /// Element type of an array.
    pub fn element(&self) -> Option<&StorageType> {
        match self {
            StorageType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Render as a schema definition value.
    pub fn to_json(&self) -> Value {
        match self {
            StorageType::Scalar(kind) => Value::from(kind.storage_name()),
            StorageType::ObjectId => Value::from("ObjectId"),
            StorageType::Nested(fields) => fields.to_json(),
            StorageType::Array(inner) => Value::Array(vec![inner.to_json()]),
            StorageType::Map(of) => json!({ "type": "Map", "of": of.to_json() }),
        }
    }
}

/// A compiled field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageField {
    /// Storage type.
    pub ty: StorageType,
    /// Whether a value must be present.
    pub required: bool,
    /// Referenced collection, present only for reference fields.
    pub reference: Option<String>,
    /// Constraints and translated attributes.
    pub options: Options,
}

impl StorageField {
    /// Create a field with no reference and no options.
    pub fn new(ty: StorageType, required: bool) -> Self {
        Self {
            ty,
            required,
            reference: None,
            options: Options::new(),
        }
    }

    /// Set the referenced collection.
    pub fn with_reference(mut self, collection: impl Into<String>) -> Self {
        self.reference = Some(collection.into());
        self
    }

    /// Add an option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Check if this is a reference field.
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Look up an option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Render as a schema definition entry.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        match &self.ty {
            StorageType::Map(of) => {
                out.insert("type".into(), Value::from("Map"));
                out.insert("of".into(), of.to_json());
            }
            ty => {
                out.insert("type".into(), ty.to_json());
            }
        }
        out.insert("required".into(), Value::Bool(self.required));
        if let Some(collection) = &self.reference {
            out.insert("ref".into(), Value::from(collection.as_str()));
        }
        for (key, value) in &self.options {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// Ordered set of compiled fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StorageFields {
    fields: IndexMap<String, StorageField>,
}

impl StorageFields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, field: StorageField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, field: StorageField) {
        self.fields.insert(name.into(), field);
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&StorageField> {
        self.fields.get(name)
    }

    /// Check if a field exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StorageField)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Field names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields that reference another collection.
    pub fn reference_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter_map(|(name, field)| field.reference.as_deref().map(|r| (name, r)))
    }

    /// Render as a schema definition document.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, field)| (name.clone(), field.to_json()))
                .collect(),
        )
    }
}

impl Serialize for StorageFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
