//! Description vocabulary.
//!
//! Stateless constructors for [`TypeNode`] trees. Entity wrapping, references,
//! constraints and dictionaries extend the generic object/array/scalar
//! primitives.
//!
//! ```
//! use docschema_core::schema::vocab::*;
//!
//! let user = entity([
//!     ("email", constraints(string(), [("unique", true.into())])),
//!     ("permissions", dictionary(number())),
//!     ("company", reference(any(), "Companies")),
//! ]);
//! assert!(user.get("_id").is_some());
//! ```

use super::node::{
    Annotated, ArrayNode, DictionaryNode, Meta, ObjectNode, Options, ReferenceNode, ScalarKind,
    ScalarNode, TypeNode,
};
use crate::document::current_millis;
use indexmap::IndexMap;

/// Identifier field injected by [`entity`].
pub const ID_FIELD: &str = "_id";

/// Creation timestamp field.
pub const CREATED_AT: &str = "createdAt";

/// Modification timestamp field.
pub const UPDATED_AT: &str = "updatedAt";

/// Format of a raw identifier: 24 lowercase hex characters.
pub const OBJECT_ID_PATTERN: &str = "^[a-f0-9]{24}$";

fn scalar(kind: ScalarKind) -> TypeNode {
    TypeNode::Scalar(ScalarNode {
        scalar: kind,
        meta: Meta::default(),
    })
}

/// A string scalar.
pub fn string() -> TypeNode {
    scalar(ScalarKind::String)
}

/// A number scalar.
pub fn number() -> TypeNode {
    scalar(ScalarKind::Number)
}

/// A boolean scalar.
pub fn boolean() -> TypeNode {
    scalar(ScalarKind::Boolean)
}

/// A raw identifier: a string in the 24-hex format.
pub fn object_id() -> TypeNode {
    string().pattern(OBJECT_ID_PATTERN)
}

/// Mark a node optional.
pub fn optional<N: Annotated>(node: N) -> N {
    node.optional()
}

/// An open object with properties in the given order.
pub fn object<I, K, N>(properties: I) -> ObjectNode
where
    I: IntoIterator<Item = (K, N)>,
    K: Into<String>,
    N: Into<TypeNode>,
{
    ObjectNode {
        properties: properties
            .into_iter()
            .map(|(name, node)| (name.into(), node.into()))
            .collect(),
        required: None,
        additional_properties: true,
        meta: Meta::default(),
    }
}

/// A closed object: undeclared properties are rejected.
pub fn strict_object<I, K, N>(properties: I) -> ObjectNode
where
    I: IntoIterator<Item = (K, N)>,
    K: Into<String>,
    N: Into<TypeNode>,
{
    object(properties).closed()
}

/// A closed object with options.
///
/// An `additionalProperties` boolean in `opts` overrides the closed default;
/// every other option becomes an attribute of the object.
pub fn strict_object_with<I, K, N>(properties: I, opts: Options) -> ObjectNode
where
    I: IntoIterator<Item = (K, N)>,
    K: Into<String>,
    N: Into<TypeNode>,
{
    let mut node = strict_object(properties);
    for (key, value) in opts {
        if key == "additionalProperties" {
            if let Some(open) = value.as_bool() {
                node.additional_properties = open;
                continue;
            }
        }
        node.meta.attributes.insert(key, value);
    }
    node
}

/// Wrap properties as a stored entity.
///
/// Adds the identifier field and the two timestamp fields, each timestamp
/// defaulting to the construction time in milliseconds.
pub fn entity<I, K, N>(properties: I) -> ObjectNode
where
    I: IntoIterator<Item = (K, N)>,
    K: Into<String>,
    N: Into<TypeNode>,
{
    into_entity(object(properties))
}

/// Turn an existing object description into an entity, as [`entity`] does.
pub fn into_entity(node: ObjectNode) -> ObjectNode {
    let now = current_millis();
    node.property(ID_FIELD, object_id())
        .property(CREATED_AT, number().default_value(now))
        .property(UPDATED_AT, number().default_value(now))
}

/// An array of `items`.
pub fn array(items: impl Into<TypeNode>) -> TypeNode {
    TypeNode::Array(ArrayNode {
        items: Box::new(items.into()),
        meta: Meta::default(),
    })
}

/// Marker for an untyped reference target.
#[derive(Debug, Clone, Copy)]
pub struct Any;

/// Untyped reference target.
pub fn any() -> Any {
    Any
}

/// Anything usable as the expanded shape of a reference.
pub trait IntoTarget {
    fn into_target(self) -> Option<Box<TypeNode>>;
}

impl<T: Into<TypeNode>> IntoTarget for T {
    fn into_target(self) -> Option<Box<TypeNode>> {
        Some(Box::new(self.into()))
    }
}

impl IntoTarget for Any {
    fn into_target(self) -> Option<Box<TypeNode>> {
        None
    }
}

fn reference_node(target: impl IntoTarget, collection: impl Into<String>, many: bool) -> TypeNode {
    TypeNode::Reference(ReferenceNode {
        target: target.into_target(),
        collection: collection.into(),
        many,
        meta: Meta::default(),
    })
}

/// A single foreign key into `collection`.
pub fn reference(target: impl IntoTarget, collection: impl Into<String>) -> TypeNode {
    reference_node(target, collection, false)
}

/// An array of foreign keys into `collection`.
pub fn reference_array(target: impl IntoTarget, collection: impl Into<String>) -> TypeNode {
    reference_node(target, collection, true)
}

/// Attach constraints to a node without changing its shape.
pub fn constraints<N, I, K>(node: N, constraints: I) -> N
where
    N: Annotated,
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    node.with_constraints(
        constraints
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect(),
    )
}

/// A string-keyed dictionary of `values`.
pub fn dictionary(values: impl Into<TypeNode>) -> TypeNode {
    dictionary_with_keys(values, IndexMap::new())
}

/// A dictionary whose keys are constrained by `key_options` (e.g. `pattern`).
pub fn dictionary_with_keys(values: impl Into<TypeNode>, key_options: Options) -> TypeNode {
    TypeNode::Dictionary(DictionaryNode {
        values: Box::new(values.into()),
        key_options,
        meta: Meta::default(),
    })
}
