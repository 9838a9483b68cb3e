//! Rendering rules for entity documents.

use crate::document::{Document, Value};
use crate::schema::vocab::ID_FIELD;
use crate::storage::Transform;
use serde_json::{Map, Value as Json};
use std::collections::BTreeSet;

/// Rewrites a document's rendering so identifiers appear as plain strings.
///
/// `_id` always becomes a string. Each expandable field that was not
/// expanded on load is rendered as its raw key string (or an array of key
/// strings); expanded fields keep their nested rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializationTransform {
    expandable: BTreeSet<String>,
}

impl SerializationTransform {
    /// Create a transform for the given expandable fields.
    pub fn new(expandable: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            expandable: expandable.into_iter().map(Into::into).collect(),
        }
    }

    /// Expandable field names.
    pub fn expandable(&self) -> impl Iterator<Item = &str> {
        self.expandable.iter().map(String::as_str)
    }
}

impl Transform for SerializationTransform {
    fn apply(&self, doc: &Document, ret: &mut Map<String, Json>) {
        ret.insert(ID_FIELD.to_string(), Json::String(doc.id().to_hex()));

        for field in &self.expandable {
            if doc.is_populated(field) {
                continue;
            }
            match doc.get(field) {
                Some(Value::ObjectId(id)) => {
                    ret.insert(field.clone(), Json::String(id.to_hex()));
                }
                Some(Value::Array(items)) => {
                    let keys = items.iter().map(key_string).collect();
                    ret.insert(field.clone(), Json::Array(keys));
                }
                _ => {}
            }
        }
    }
}

fn key_string(value: &Value) -> Json {
    match value {
        Value::ObjectId(id) => Json::String(id.to_hex()),
        other => other.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ObjectId;
    use serde_json::json;

    #[test]
    fn test_id_rendered_as_string() {
        let doc = Document::new(ObjectId::new());
        let mut ret = doc.to_json();

        SerializationTransform::default().apply(&doc, &mut ret);
        assert_eq!(ret["_id"], json!(doc.id().to_hex()));
    }

    #[test]
    fn test_unexpanded_references_become_strings() {
        let company = ObjectId::new();
        let friends = [ObjectId::new(), ObjectId::new()];
        let mut doc = Document::new(ObjectId::new());
        doc.set("company", company);
        doc.set("friends", friends.iter().copied().map(Value::from).collect::<Vec<_>>());
        doc.set("owner", ObjectId::new());

        let mut ret = doc.to_json();
        SerializationTransform::new(["company", "friends"]).apply(&doc, &mut ret);

        assert_eq!(ret["company"], json!(company.to_hex()));
        assert_eq!(ret["friends"], json!([friends[0].to_hex(), friends[1].to_hex()]));
        // Not expandable: native rendering.
        assert!(ret["owner"].get("$oid").is_some());
    }

    #[test]
    fn test_expanded_references_keep_nested_rendering() {
        let mut company = Document::new(ObjectId::new());
        company.set("name", "Acme");
        let mut doc = Document::new(ObjectId::new());
        doc.set_populated("company", Value::from(company.clone()));

        let mut ret = doc.to_json();
        SerializationTransform::new(["company"]).apply(&doc, &mut ret);

        assert_eq!(ret["company"]["name"], "Acme");
        assert_eq!(ret["company"]["_id"], json!({ "$oid": company.id().to_hex() }));
    }

    #[test]
    fn test_missing_field_left_alone() {
        let doc = Document::new(ObjectId::new());
        let mut ret = doc.to_json();
        SerializationTransform::new(["company"]).apply(&doc, &mut ret);

        assert!(!ret.contains_key("company"));
        assert_eq!(ret.len(), 1);
    }
}
