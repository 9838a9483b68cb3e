//! Command implementations. Each returns the text to print.

use crate::error::CliError;
use docschema_core::schema::vocab::into_entity;
use docschema_core::schema::{compile, ObjectNode, TypeNode};
use docschema_core::storage::DocumentStore;
use docschema_core::register;
use std::path::Path;
use tracing::debug;

/// Load a description file, optionally wrapping it as an entity.
pub fn load_description(path: &Path, entity: bool) -> Result<ObjectNode, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let node = TypeNode::from_json(&text).map_err(|source| CliError::Description {
        path: path.to_path_buf(),
        source,
    })?;

    let object = match node {
        TypeNode::Object(object) => object,
        other => {
            return Err(CliError::NotAnObject {
                path: path.to_path_buf(),
                kind: other.kind_name(),
            })
        }
    };
    debug!(path = %path.display(), properties = object.properties.len(), "description loaded");

    Ok(if entity { into_entity(object) } else { object })
}

/// `compile`: print the compiled storage definition.
pub fn compile_command(path: &Path, entity: bool) -> Result<String, CliError> {
    let description = load_description(path, entity)?;
    let fields = compile(&description).map_err(docschema_core::Error::from)?;
    Ok(serde_json::to_string_pretty(&fields)?)
}

/// `register`: register the description and print its catalog entry.
pub fn register_command(
    store: &DocumentStore,
    name: &str,
    path: &Path,
    entity: bool,
    expand: &[String],
) -> Result<String, CliError> {
    let description = load_description(path, entity)?;
    let expandable: Vec<&str> = expand.iter().map(String::as_str).collect();

    register(store, name, &description, &expandable)?;
    store.flush().map_err(CliError::Core)?;

    let entry = store
        .catalog_entry(name)
        .ok_or_else(|| docschema_core::Error::UnknownCollection(name.to_string()))?;
    Ok(serde_json::to_string_pretty(&entry)?)
}

/// `status`: print store status.
pub fn status_command(store: &DocumentStore) -> Result<String, CliError> {
    let status = store.status()?;
    Ok(serde_json::to_string_pretty(&status)?)
}
