//! Write-path checks: casting, strict mode, required fields and options.

use crate::document::{ObjectId, Value, OID_KEY};
use crate::error::Error;
use crate::schema::{ScalarKind, StorageField, StorageFields, StorageType, KEY_MATCH_OPTION};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Regex option applied to string values.
pub const MATCH_OPTION: &str = "match";

/// Value used when a field is missing.
pub const DEFAULT_OPTION: &str = "default";

/// Compiled regex options keyed by their source pattern.
pub(crate) type Patterns = HashMap<String, Regex>;

/// Compile every `match` and `keyMatch` option in `fields`.
pub(crate) fn compile_patterns(fields: &StorageFields) -> Result<Patterns, Error> {
    let mut patterns = Patterns::new();
    collect_fields(fields, &mut patterns)?;
    Ok(patterns)
}

fn collect_fields(fields: &StorageFields, patterns: &mut Patterns) -> Result<(), Error> {
    for (_, field) in fields.iter() {
        collect_field(field, patterns)?;
    }
    Ok(())
}

fn collect_field(field: &StorageField, patterns: &mut Patterns) -> Result<(), Error> {
    for key in [MATCH_OPTION, KEY_MATCH_OPTION] {
        let Some(option) = field.option(key) else {
            continue;
        };
        let source = option
            .as_str()
            .ok_or_else(|| Error::InvalidSchema(format!("option '{}' must be a string", key)))?;
        if !patterns.contains_key(source) {
            let regex = Regex::new(source)
                .map_err(|e| Error::InvalidSchema(format!("bad pattern '{}': {}", source, e)))?;
            patterns.insert(source.to_string(), regex);
        }
    }
    collect_type(&field.ty, patterns)
}

fn collect_type(ty: &StorageType, patterns: &mut Patterns) -> Result<(), Error> {
    match ty {
        StorageType::Nested(fields) => collect_fields(fields, patterns),
        StorageType::Array(inner) => collect_type(inner, patterns),
        StorageType::Map(of) => collect_field(of, patterns),
        StorageType::Scalar(_) | StorageType::ObjectId => Ok(()),
    }
}

/// Checks document values against a collection's compiled fields.
pub(crate) struct Validator<'a> {
    collection: &'a str,
    patterns: &'a Patterns,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(collection: &'a str, patterns: &'a Patterns) -> Self {
        Self {
            collection,
            patterns,
        }
    }

    /// Validate top-level values in place.
    pub(crate) fn validate(
        &self,
        fields: &StorageFields,
        values: &mut IndexMap<String, Value>,
    ) -> Result<(), Error> {
        self.check_object(fields, values, "")
    }

    fn check_object(
        &self,
        fields: &StorageFields,
        values: &mut IndexMap<String, Value>,
        prefix: &str,
    ) -> Result<(), Error> {
        values.retain(|name, _| {
            let declared = fields.contains(name);
            if !declared {
                debug!(
                    collection = self.collection,
                    field = %join(prefix, name),
                    "dropping undeclared field"
                );
            }
            declared
        });

        for (name, field) in fields.iter() {
            let path = join(prefix, name);
            let missing = values.get(name).map_or(true, Value::is_null);
            if missing {
                match field.option(DEFAULT_OPTION) {
                    Some(default) => {
                        values.insert(name.to_string(), Value::from_json(default));
                    }
                    None if field.required => {
                        return Err(Error::validation(self.collection, &path, "field is required"));
                    }
                    None => continue,
                }
            }

            if let Some(value) = values.get_mut(name) {
                self.check_field(field, &field.ty, value, &path)?;
            }
        }
        Ok(())
    }

    fn check_field(
        &self,
        field: &StorageField,
        ty: &StorageType,
        value: &mut Value,
        path: &str,
    ) -> Result<(), Error> {
        match ty {
            StorageType::Scalar(kind) => self.check_scalar(field, *kind, value, path),
            StorageType::ObjectId => self.cast_object_id(value, path),
            StorageType::Nested(fields) => match value {
                Value::Object(map) => self.check_object(fields, map, path),
                Value::ObjectId(_) => Err(self.reserved_key(path, OID_KEY)),
                other => Err(self.mismatch(path, "object", other)),
            },
            StorageType::Array(inner) => match value {
                Value::Array(items) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        self.check_field(field, inner, item, &format!("{}.{}", path, i))?;
                    }
                    Ok(())
                }
                other => Err(self.mismatch(path, "array", other)),
            },
            StorageType::Map(of) => match value {
                Value::Object(map) => self.check_map(field, of, map, path),
                Value::ObjectId(_) => Err(self.reserved_key(path, OID_KEY)),
                other => Err(self.mismatch(path, "map", other)),
            },
        }
    }

    fn check_map(
        &self,
        field: &StorageField,
        of: &StorageField,
        map: &mut IndexMap<String, Value>,
        path: &str,
    ) -> Result<(), Error> {
        let key_pattern = field
            .option(KEY_MATCH_OPTION)
            .and_then(|p| p.as_str())
            .and_then(|p| self.patterns.get(p));

        for (key, value) in map.iter_mut() {
            if key.starts_with('$') {
                return Err(self.reserved_key(path, key));
            }
            let entry_path = join(path, key);
            if let Some(regex) = key_pattern {
                if !regex.is_match(key) {
                    return Err(Error::validation(
                        self.collection,
                        &entry_path,
                        format!("key does not match /{}/", regex.as_str()),
                    ));
                }
            }
            if value.is_null() {
                if of.required {
                    return Err(Error::validation(self.collection, &entry_path, "value is required"));
                }
                continue;
            }
            self.check_field(of, &of.ty, value, &entry_path)?;
        }
        Ok(())
    }

    fn check_scalar(
        &self,
        field: &StorageField,
        kind: ScalarKind,
        value: &Value,
        path: &str,
    ) -> Result<(), Error> {
        match (kind, value) {
            (ScalarKind::String, Value::String(s)) => self.check_string(field, s, path),
            (ScalarKind::Number, Value::Number(n)) => self.check_number(field, *n, path),
            (ScalarKind::Boolean, Value::Bool(_)) => Ok(()),
            (kind, other) => Err(self.mismatch(path, kind.storage_name(), other)),
        }
    }

    fn check_string(&self, field: &StorageField, s: &str, path: &str) -> Result<(), Error> {
        if let Some(regex) = field
            .option(MATCH_OPTION)
            .and_then(|p| p.as_str())
            .and_then(|p| self.patterns.get(p))
        {
            if !regex.is_match(s) {
                return Err(Error::validation(
                    self.collection,
                    path,
                    format!("value does not match /{}/", regex.as_str()),
                ));
            }
        }

        let len = s.chars().count() as u64;
        if let Some(min) = field.option("minlength").and_then(|v| v.as_u64()) {
            if len < min {
                return Err(Error::validation(
                    self.collection,
                    path,
                    format!("shorter than {} characters", min),
                ));
            }
        }
        if let Some(max) = field.option("maxlength").and_then(|v| v.as_u64()) {
            if len > max {
                return Err(Error::validation(
                    self.collection,
                    path,
                    format!("longer than {} characters", max),
                ));
            }
        }
        if let Some(allowed) = field.option("enum").and_then(|v| v.as_array()) {
            if !allowed.iter().any(|a| a.as_str() == Some(s)) {
                return Err(Error::validation(self.collection, path, "value is not an allowed option"));
            }
        }
        Ok(())
    }

    fn check_number(&self, field: &StorageField, n: f64, path: &str) -> Result<(), Error> {
        if let Some(min) = field.option("min").and_then(|v| v.as_f64()) {
            if n < min {
                return Err(Error::validation(self.collection, path, format!("less than {}", min)));
            }
        }
        if let Some(max) = field.option("max").and_then(|v| v.as_f64()) {
            if n > max {
                return Err(Error::validation(self.collection, path, format!("greater than {}", max)));
            }
        }
        Ok(())
    }

    /// Accept identifiers, 24-hex strings and expanded documents.
    fn cast_object_id(&self, value: &mut Value, path: &str) -> Result<(), Error> {
        let id = match value {
            Value::ObjectId(_) => return Ok(()),
            Value::String(s) => ObjectId::parse_str(s).map_err(|_| {
                Error::validation(self.collection, path, format!("cannot cast '{}' to ObjectId", s))
            })?,
            Value::Document(doc) => doc.id(),
            other => return Err(self.mismatch(path, "ObjectId", other)),
        };
        *value = Value::ObjectId(id);
        Ok(())
    }

    /// `$`-prefixed keys are reserved for identifiers in stored documents.
    fn reserved_key(&self, path: &str, key: &str) -> Error {
        Error::validation(
            self.collection,
            &join(path, key),
            "keys starting with '$' are reserved",
        )
    }

    fn mismatch(&self, path: &str, expected: &str, found: &Value) -> Error {
        Error::validation(
            self.collection,
            path,
            format!("expected {}, found {}", expected, found.kind_name()),
        )
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{compile, vocab::*, Annotated, TypeNode};
    use serde_json::json;

    fn values(json: serde_json::Value) -> IndexMap<String, Value> {
        match Value::from_json(&json) {
            Value::Object(map) => map,
            other => panic!("not an object: {:?}", other),
        }
    }

    fn run(fields: &StorageFields, json: serde_json::Value) -> Result<IndexMap<String, Value>, Error> {
        let patterns = compile_patterns(fields)?;
        let mut map = values(json);
        Validator::new("Test", &patterns).validate(fields, &mut map)?;
        Ok(map)
    }

    fn user_fields() -> StorageFields {
        compile(&object([
            ("name", string()),
            ("email", optional(string().pattern("^[^@]+@[^@]+$"))),
            ("company", optional(reference(any(), "Companies"))),
            ("tags", optional(array(string()))),
            ("scores", optional(dictionary(number()))),
        ]))
        .unwrap()
    }

    #[test]
    fn test_accepts_valid_document() {
        let map = run(
            &user_fields(),
            json!({ "name": "Alice", "email": "a@example.com", "tags": ["x"], "scores": { "math": 3 } }),
        )
        .unwrap();
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_required_field_missing() {
        let err = run(&user_fields(), json!({ "email": "a@example.com" })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "name"));

        let err = run(&user_fields(), json!({ "name": null })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "name"));
    }

    #[test]
    fn test_undeclared_fields_are_dropped() {
        let map = run(&user_fields(), json!({ "name": "Alice", "role": "admin" })).unwrap();
        assert!(!map.contains_key("role"));
    }

    #[test]
    fn test_object_id_cast() {
        let id = ObjectId::new();
        let map = run(&user_fields(), json!({ "name": "A", "company": id.to_hex() })).unwrap();
        assert_eq!(map["company"], Value::ObjectId(id));

        let err = run(&user_fields(), json!({ "name": "A", "company": "nope" })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "company"));
    }

    #[test]
    fn test_match_option() {
        let err = run(&user_fields(), json!({ "name": "A", "email": "invalid" })).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_kind_mismatch_reports_path() {
        let err = run(&user_fields(), json!({ "name": "A", "tags": ["x", 1] })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "tags.1"));

        let err = run(&user_fields(), json!({ "name": "A", "scores": { "math": "high" } })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "scores.math"));
    }

    #[test]
    fn test_key_match_on_dictionary() {
        let fields = compile(&object([(
            "labels",
            dictionary_with_keys(
                string(),
                [("pattern".to_string(), json!("^[a-z]+$"))].into_iter().collect(),
            ),
        )]))
        .unwrap();

        assert!(run(&fields, json!({ "labels": { "ok": "1" } })).is_ok());
        let err = run(&fields, json!({ "labels": { "NOT_OK": "1" } })).unwrap_err();
        assert!(err.to_string().contains("key does not match"));
    }

    #[test]
    fn test_dollar_keys_in_maps_are_reserved() {
        let fields = compile(&object([
            ("labels", optional(dictionary(string()))),
            ("address", optional(TypeNode::from(object([("city", optional(string()))])))),
        ]))
        .unwrap();
        let hex = ObjectId::new().to_hex();

        let err = run(&fields, json!({ "labels": { "$oid": hex } })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, ref message, .. }
            if path == "labels.$oid" && message.contains("reserved")));

        let err = run(&fields, json!({ "labels": { "a": "b", "$set": "c" } })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "labels.$set"));

        let err = run(&fields, json!({ "address": { "$oid": hex } })).unwrap_err();
        assert!(matches!(err, Error::Validation { ref path, .. } if path == "address.$oid"));

        assert!(run(&fields, json!({ "labels": { "oid": hex } })).is_ok());
    }

    #[test]
    fn test_default_fills_missing_field() {
        let fields = compile(&object([("level", number().default_value(1))])).unwrap();
        let map = run(&fields, json!({})).unwrap();
        assert_eq!(map["level"], Value::Number(1.0));
    }

    #[test]
    fn test_nested_strict_mode() {
        let fields = compile(&object([(
            "address",
            TypeNode::from(strict_object([("city", string())])),
        )]))
        .unwrap();

        let map = run(&fields, json!({ "address": { "city": "Oslo", "zip": "0150" } })).unwrap();
        let address = map["address"].as_object().unwrap();
        assert_eq!(address.len(), 1);
    }

    #[test]
    fn test_open_and_closed_objects_store_alike() {
        let open = compile(&object([(
            "address",
            TypeNode::from(object([("city", string())])),
        )]))
        .unwrap();
        let closed = compile(&object([(
            "address",
            TypeNode::from(strict_object([("city", string())])),
        )]))
        .unwrap();
        assert_eq!(open.to_json(), closed.to_json());

        let map = run(&open, json!({ "address": { "city": "Oslo", "zip": "0150" } })).unwrap();
        assert_eq!(map["address"].as_object().map(IndexMap::len), Some(1));
    }

    #[test]
    fn test_bad_pattern_is_invalid_schema() {
        let fields = StorageFields::new().with_field(
            "code",
            StorageField::new(StorageType::Scalar(ScalarKind::String), true).with_option("match", "("),
        );
        assert!(matches!(compile_patterns(&fields), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_number_bounds() {
        let fields = StorageFields::new().with_field(
            "age",
            StorageField::new(StorageType::Scalar(ScalarKind::Number), true)
                .with_option("min", 0)
                .with_option("max", 150),
        );
        assert!(run(&fields, json!({ "age": 30 })).is_ok());
        assert!(run(&fields, json!({ "age": -1 })).is_err());
        assert!(run(&fields, json!({ "age": 200 })).is_err());
    }
}
