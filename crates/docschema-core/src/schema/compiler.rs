//! Compiler from type descriptions to storage fields.
//!
//! The walk is depth-first and keeps declared property order. Each node
//! variant has exactly one branch; anything the storage schema cannot express
//! is rejected with a [`CompileError`] naming the offending field path.

use super::error::CompileError;
use super::field::{StorageField, StorageFields, StorageType};
use super::node::{Meta, ObjectNode, Options, ReferenceNode, TypeNode};
use super::vocab::ID_FIELD;
use tracing::debug;

/// Attribute renames applied when copying options into a compiled field.
const TRANSLATIONS: &[(&str, &str)] = &[("pattern", "match")];

/// Keys the compiler writes itself.
const RESERVED_OPTIONS: &[&str] = &["type", "required", "ref", "of"];

/// Option carrying a dictionary's key pattern.
pub const KEY_MATCH_OPTION: &str = "keyMatch";

/// Compile an object description into storage fields.
pub fn compile(node: &ObjectNode) -> Result<StorageFields, CompileError> {
    Compiler::compile(node)
}

/// Compiler for type descriptions.
pub struct Compiler;

impl Compiler {
    /// Compile an object description into storage fields.
    pub fn compile(node: &ObjectNode) -> Result<StorageFields, CompileError> {
        let fields = Self::compile_object(node, "")?;
        debug!(fields = fields.len(), "compiled description");
        Ok(fields)
    }

    fn compile_object(obj: &ObjectNode, path: &str) -> Result<StorageFields, CompileError> {
        let mut fields = StorageFields::new();

        for (name, node) in &obj.properties {
            // Identifiers are supplied by the storage engine.
            if name == ID_FIELD {
                continue;
            }

            let field_path = child_path(path, name);
            if name.trim().is_empty() {
                return Err(CompileError::empty_field_name(&field_path));
            }

            let required = Self::is_required(obj, name, node);
            fields.insert(name.clone(), Self::compile_field(node, required, &field_path)?);
        }

        Ok(fields)
    }

    /// Declared membership wins; without a declared set the optional
    /// modifier decides.
    fn is_required(obj: &ObjectNode, name: &str, node: &TypeNode) -> bool {
        match &obj.required {
            Some(required) => required.contains(name),
            None => !node.is_optional(),
        }
    }

    fn compile_field(
        node: &TypeNode,
        required: bool,
        path: &str,
    ) -> Result<StorageField, CompileError> {
        if let TypeNode::Reference(reference) = node {
            return Self::compile_reference(reference, required, path);
        }

        let ty = Self::resolve_type(node, path)?;
        let (chain, innermost) = meta_chain(node);
        let mut options = Self::options(chain, path)?;

        if let TypeNode::Dictionary(dict) = innermost {
            if let Some(pattern) = dict.key_options.get("pattern") {
                options.insert(KEY_MATCH_OPTION.to_string(), pattern.clone());
            }
        }

        Ok(StorageField {
            ty,
            required,
            reference: None,
            options,
        })
    }

    fn compile_reference(
        reference: &ReferenceNode,
        required: bool,
        path: &str,
    ) -> Result<StorageField, CompileError> {
        if reference.collection.trim().is_empty() {
            return Err(CompileError::empty_reference_target(path));
        }

        let ty = if reference.many {
            StorageType::Array(Box::new(StorageType::ObjectId))
        } else {
            StorageType::ObjectId
        };

        Ok(StorageField {
            ty,
            required,
            reference: Some(reference.collection.clone()),
            options: Self::options([&reference.meta], path)?,
        })
    }

    fn resolve_type(node: &TypeNode, path: &str) -> Result<StorageType, CompileError> {
        match node {
            TypeNode::Scalar(scalar) => Ok(StorageType::Scalar(scalar.scalar)),
            TypeNode::Object(obj) => Ok(StorageType::Nested(Self::compile_object(obj, path)?)),
            TypeNode::Array(array) => {
                let element = Self::resolve_type(&array.items, &format!("{}[]", path))?;
                Ok(StorageType::Array(Box::new(element)))
            }
            TypeNode::Dictionary(dict) => {
                let value_path = format!("{}{{}}", path);
                let of = Self::compile_field(&dict.values, !dict.values.is_optional(), &value_path)?;
                Ok(StorageType::Map(Box::new(of)))
            }
            TypeNode::Reference(_) => Err(CompileError::nested_reference(path)),
        }
    }

    /// Merge constraints then attributes of each meta, outermost first.
    fn options<'a>(
        metas: impl IntoIterator<Item = &'a Meta>,
        path: &str,
    ) -> Result<Options, CompileError> {
        let mut options = Options::new();

        for meta in metas {
            for (key, value) in meta.constraints.iter().chain(meta.attributes.iter()) {
                let key = translate(key);
                if RESERVED_OPTIONS.contains(&key) {
                    return Err(CompileError::reserved_option(key, path));
                }
                options.insert(key.to_string(), value.clone());
            }
        }

        Ok(options)
    }
}

fn translate(key: &str) -> &str {
    TRANSLATIONS
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
        .unwrap_or(key)
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Metadata of `node` and every array level below it, plus the first
/// non-array node.
fn meta_chain(node: &TypeNode) -> (Vec<&Meta>, &TypeNode) {
    let mut chain = vec![node.meta()];
    let mut current = node;
    while let TypeNode::Array(array) = current {
        current = &array.items;
        chain.push(current.meta());
    }
    (chain, current)
}
