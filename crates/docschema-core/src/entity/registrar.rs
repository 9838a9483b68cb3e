//! Entity registration: compile, define, attach rendering, register.

use super::SerializationTransform;
use crate::error::Error;
use crate::schema::{compile, ObjectNode};
use crate::storage::{RepresentationKind, Schema, SchemaOptions, StorageEngine};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Register an entity description as a storage collection.
///
/// The description is compiled, defined with timestamps, given the
/// serialization transform for both plain and wire rendering, and
/// registered under `name`. Every `expandable` field must be a compiled
/// reference field.
pub fn register<E: StorageEngine>(
    engine: &E,
    name: &str,
    description: &ObjectNode,
    expandable: &[&str],
) -> Result<E::Handle, Error> {
    let schema = prepare(name, description, expandable)?;
    let fields = schema.fields().len();

    let handle = engine.register_collection(name, schema)?;
    info!(entity = name, fields, expandable = ?expandable, "entity registered");
    Ok(handle)
}

/// Build the storage schema for an entity without registering it.
pub fn prepare(name: &str, description: &ObjectNode, expandable: &[&str]) -> Result<Schema, Error> {
    let fields = compile(description)?;

    for field in expandable {
        if !fields.get(field).is_some_and(|f| f.is_reference()) {
            return Err(Error::InvalidExpandable {
                entity: name.to_string(),
                field: field.to_string(),
            });
        }
    }

    let transform = Arc::new(SerializationTransform::new(expandable.iter().copied()));
    Ok(Schema::define(fields, SchemaOptions { timestamps: true })
        .with_expandable(expandable.iter().copied())
        .with_transform(
            transform,
            &[RepresentationKind::Plain, RepresentationKind::Wire],
        ))
}

struct PendingEntity {
    name: String,
    description: ObjectNode,
    expandable: Vec<String>,
}

/// Registers several entities against one engine.
///
/// All descriptions are compiled and checked, and every name is checked
/// against the engine, before the first collection is registered.
pub struct Registrar<'a, E> {
    engine: &'a E,
    pending: Vec<PendingEntity>,
}

impl<'a, E: StorageEngine> Registrar<'a, E> {
    /// Create a registrar for `engine`.
    pub fn new(engine: &'a E) -> Self {
        Self {
            engine,
            pending: Vec::new(),
        }
    }

    /// Queue an entity.
    pub fn entity(mut self, name: impl Into<String>, description: ObjectNode, expandable: &[&str]) -> Self {
        self.pending.push(PendingEntity {
            name: name.into(),
            description,
            expandable: expandable.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    /// Number of queued entities.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Register every queued entity, returning handles by name.
    pub fn register_all(self) -> Result<IndexMap<String, E::Handle>, Error> {
        let mut seen = HashSet::new();
        let mut schemas = Vec::with_capacity(self.pending.len());
        for entity in &self.pending {
            if !seen.insert(entity.name.as_str()) || self.engine.has_collection(&entity.name) {
                return Err(Error::DuplicateRegistration(entity.name.clone()));
            }
            let expandable: Vec<&str> = entity.expandable.iter().map(String::as_str).collect();
            schemas.push((
                entity.name.as_str(),
                prepare(&entity.name, &entity.description, &expandable)?,
            ));
        }

        let mut handles = IndexMap::with_capacity(schemas.len());
        for (name, schema) in schemas {
            let fields = schema.fields().len();
            let handle = self.engine.register_collection(name, schema)?;
            info!(entity = name, fields, "entity registered");
            handles.insert(name.to_string(), handle);
        }
        Ok(handles)
    }
}
