//! Type-description nodes.
//!
//! A description is a tree of [`TypeNode`]s. Every node carries [`Meta`]: the
//! optionality modifier, free-form attributes (`pattern`, `default`, ...) and
//! constraints attached through [`constraints`](super::vocab::constraints).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ordered key/value options (attributes, constraints, key options).
pub type Options = IndexMap<String, serde_json::Value>;

/// Scalar kinds supported by descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// UTF-8 string.
    String,
    /// Number (stored as f64).
    Number,
    /// Boolean.
    Boolean,
}

impl ScalarKind {
    /// Name used in compiled storage schemas.
    pub fn storage_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Number => "Number",
            ScalarKind::Boolean => "Boolean",
        }
    }
}

/// Metadata shared by every node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Optional modifier.
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    /// Builder options, copied into the compiled field.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: Options,
    /// Extra constraints, merged verbatim into the compiled field.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: Options,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_true() -> bool {
    true
}

/// A scalar leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarNode {
    #[serde(rename = "type")]
    pub scalar: ScalarKind,
    #[serde(flatten)]
    pub meta: Meta,
}

/// An object with ordered properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNode {
    /// Properties in declaration order.
    pub properties: IndexMap<String, TypeNode>,
    /// Declared required set. When absent, each property's optional
    /// modifier decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<BTreeSet<String>>,
    /// Whether the description accepts undeclared properties. Not compiled;
    /// the store drops undeclared fields either way.
    #[serde(default = "default_true")]
    pub additional_properties: bool,
    #[serde(flatten)]
    pub meta: Meta,
}

/// A homogeneous array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayNode {
    pub items: Box<TypeNode>,
    #[serde(flatten)]
    pub meta: Meta,
}

/// A string-keyed dictionary with homogeneous values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryNode {
    pub values: Box<TypeNode>,
    /// Options on the key string (e.g. `pattern`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub key_options: Options,
    #[serde(flatten)]
    pub meta: Meta,
}

/// A foreign key into another collection.
///
/// Stands for the union of the raw identifier (or identifier array when
/// `many`) and the expanded target document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    /// Shape of the expanded document. `None` leaves it untyped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Box<TypeNode>>,
    /// Name of the referenced collection.
    pub collection: String,
    /// One-to-many reference.
    #[serde(default, skip_serializing_if = "is_false")]
    pub many: bool,
    #[serde(flatten)]
    pub meta: Meta,
}

/// An authored type description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeNode {
    Scalar(ScalarNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Dictionary(DictionaryNode),
    Reference(ReferenceNode),
}

impl TypeNode {
    /// Node metadata.
    pub fn meta(&self) -> &Meta {
        match self {
            TypeNode::Scalar(n) => &n.meta,
            TypeNode::Object(n) => &n.meta,
            TypeNode::Array(n) => &n.meta,
            TypeNode::Dictionary(n) => &n.meta,
            TypeNode::Reference(n) => &n.meta,
        }
    }

    /// Whether the optional modifier is set.
    pub fn is_optional(&self) -> bool {
        self.meta().optional
    }

    /// Short name of the node variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeNode::Scalar(_) => "scalar",
            TypeNode::Object(_) => "object",
            TypeNode::Array(_) => "array",
            TypeNode::Dictionary(_) => "dictionary",
            TypeNode::Reference(_) => "reference",
        }
    }

    /// Parse a description from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ObjectNode {
    /// Add or replace a property.
    pub fn property(mut self, name: impl Into<String>, node: impl Into<TypeNode>) -> Self {
        self.properties.insert(name.into(), node.into());
        self
    }

    /// Declare the required set explicitly.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Mark the description closed to undeclared properties.
    pub fn closed(mut self) -> Self {
        self.additional_properties = false;
        self
    }

    /// Mark the description open to undeclared properties.
    pub fn open(mut self) -> Self {
        self.additional_properties = true;
        self
    }

    /// Get a property by name.
    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.properties.get(name)
    }
}

macro_rules! impl_into_node {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for TypeNode {
                fn from(node: $ty) -> Self {
                    TypeNode::$variant(node)
                }
            }
        )*
    };
}

impl_into_node!(
    ScalarNode => Scalar,
    ObjectNode => Object,
    ArrayNode => Array,
    DictionaryNode => Dictionary,
    ReferenceNode => Reference,
);

/// Consuming builders for node metadata.
pub trait Annotated: Sized {
    /// Mutable access to the metadata of a node being built.
    fn meta_mut(&mut self) -> &mut Meta;

    /// Mark the node optional.
    fn optional(mut self) -> Self {
        self.meta_mut().optional = true;
        self
    }

    /// Set a builder attribute.
    fn attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta_mut().attributes.insert(key.into(), value.into());
        self
    }

    /// Set a `pattern` attribute.
    fn pattern(self, pattern: impl Into<String>) -> Self {
        self.attr("pattern", pattern.into())
    }

    /// Set a `default` attribute.
    fn default_value(self, value: impl Into<serde_json::Value>) -> Self {
        self.attr("default", value)
    }

    /// Set a `description` attribute.
    fn description(self, text: impl Into<String>) -> Self {
        self.attr("description", text.into())
    }

    /// Merge constraints; later keys win.
    fn with_constraints(mut self, constraints: Options) -> Self {
        self.meta_mut().constraints.extend(constraints);
        self
    }
}

impl Annotated for TypeNode {
    fn meta_mut(&mut self) -> &mut Meta {
        match self {
            TypeNode::Scalar(n) => &mut n.meta,
            TypeNode::Object(n) => &mut n.meta,
            TypeNode::Array(n) => &mut n.meta,
            TypeNode::Dictionary(n) => &mut n.meta,
            TypeNode::Reference(n) => &mut n.meta,
        }
    }
}

macro_rules! impl_annotated {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Annotated for $ty {
                fn meta_mut(&mut self) -> &mut Meta {
                    &mut self.meta
                }
            }
        )*
    };
}

impl_annotated!(ScalarNode, ObjectNode, ArrayNode, DictionaryNode, ReferenceNode);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::vocab::{array, dictionary, number, object, reference, string};

    #[test]
    fn test_meta_builders() {
        let node = string().pattern("^a").optional();
        assert!(node.is_optional());
        assert_eq!(node.meta().attributes["pattern"], "^a");
        assert_eq!(node.kind_name(), "scalar");
    }

    #[test]
    fn test_object_require_and_closed() {
        let obj = object([("a", string()), ("b", number())])
            .require(["a"])
            .closed();

        assert!(!obj.additional_properties);
        assert!(obj.required.as_ref().unwrap().contains("a"));
        assert!(obj.get("b").is_some());
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let obj = object([
            ("zeta", string()),
            ("alpha", array(number())),
            ("map", dictionary(number())),
            ("owner", reference(string(), "Users")),
        ]);
        let node = TypeNode::from(obj);

        let json = serde_json::to_string(&node).unwrap();
        let decoded = TypeNode::from_json(&json).unwrap();
        assert_eq!(node, decoded);

        if let TypeNode::Object(obj) = decoded {
            let names: Vec<_> = obj.properties.keys().cloned().collect();
            assert_eq!(names, vec!["zeta", "alpha", "map", "owner"]);
        } else {
            panic!("Expected Object");
        }
    }

    #[test]
    fn test_parse_handwritten_description() {
        let json = r#"{
            "kind": "object",
            "properties": {
                "email": { "kind": "scalar", "type": "string", "constraints": { "unique": true } },
                "nickname": { "kind": "scalar", "type": "string", "optional": true }
            }
        }"#;

        let node = TypeNode::from_json(json).unwrap();
        let TypeNode::Object(obj) = node else {
            panic!("Expected Object");
        };
        assert!(obj.additional_properties);
        assert_eq!(obj.properties["email"].meta().constraints["unique"], true);
        assert!(obj.properties["nickname"].is_optional());
    }
}
