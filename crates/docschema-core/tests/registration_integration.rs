//! Integration tests for entity registration against the document store.

use docschema_core::schema::vocab::*;
use docschema_core::schema::{compile, Annotated, ObjectNode, TypeNode};
use docschema_core::storage::{ConnectionState, DocumentStore, StoreConfig};
use docschema_core::{register, Document, Error, ObjectId, Registrar, Value};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};

struct TestContext {
    store: DocumentStore,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(StoreConfig::new(dir.path()).with_name("app")).unwrap();
        Self { store, _dir: dir }
    }
}

fn company() -> ObjectNode {
    entity([("name", string()), ("country", optional(string()))])
}

fn user() -> ObjectNode {
    entity([
        ("name", string()),
        ("email", optional(string().pattern("^[^@]+@[^@]+$")).attr("unique", true)),
        ("company", optional(reference(any(), "Companies"))),
        ("friends", optional(reference_array(any(), "Users"))),
        ("tags", array(string())),
        ("scores", optional(dictionary(number()))),
    ])
}

#[test]
fn test_entity_compiles_to_expected_definition() {
    let fields = compile(&entity([("name", string()), ("tags", array(string()))])).unwrap();
    let rendered = fields.to_json();

    assert_eq!(rendered["name"], json!({ "type": "String", "required": true }));
    assert_eq!(rendered["tags"], json!({ "type": ["String"], "required": true }));
    assert!(rendered.get("_id").is_none());
    assert_eq!(rendered["createdAt"]["type"], "Number");
    assert_eq!(rendered["updatedAt"]["type"], "Number");
}

#[test]
fn test_reference_and_dictionary_definitions() {
    let fields = compile(&object([
        ("company", reference(string(), "Companies")),
        ("owner", optional(reference(any(), "Users"))),
        ("scores", dictionary(number())),
    ]))
    .unwrap();
    let rendered = fields.to_json();

    assert_eq!(
        rendered["company"],
        json!({ "type": "ObjectId", "required": true, "ref": "Companies" })
    );
    assert_eq!(
        rendered["owner"],
        json!({ "type": "ObjectId", "required": false, "ref": "Users" })
    );
    assert_eq!(rendered["scores"]["type"], "Map");
    assert_eq!(rendered["scores"]["of"]["type"], "Number");
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let ctx = TestContext::new();
    register(&ctx.store, "Companies", &company(), &[]).unwrap();

    let result = register(&ctx.store, "Companies", &company(), &[]);
    assert!(matches!(result, Err(Error::DuplicateRegistration(name)) if name == "Companies"));
}

#[test]
fn test_unexpanded_and_expanded_rendering_agree_on_ids() {
    let ctx = TestContext::new();
    let handles = Registrar::new(&ctx.store)
        .entity("Companies", company(), &[])
        .entity("Users", user(), &["company", "friends"])
        .register_all()
        .unwrap();
    let companies = &handles["Companies"];
    let users = &handles["Users"];

    let acme = companies
        .insert_json(&json!({ "name": "Acme", "country": "NO" }))
        .unwrap();
    let bob = users
        .insert_json(&json!({ "name": "Bob", "tags": [] }))
        .unwrap();
    let alice = users
        .insert_json(&json!({
            "name": "Alice",
            "email": "alice@example.com",
            "company": acme.id().to_hex(),
            "friends": [bob.id().to_hex()],
            "tags": ["admin"],
            "scores": { "math": 3 },
        }))
        .unwrap();

    // Unexpanded: raw keys as strings.
    let loaded = users.find_by_id(alice.id()).unwrap().unwrap();
    let plain = users.to_plain(&loaded);
    assert_eq!(plain["_id"], json!(alice.id().to_hex()));
    assert_eq!(plain["company"], json!(acme.id().to_hex()));
    assert_eq!(plain["friends"], json!([bob.id().to_hex()]));
    assert_eq!(plain["scores"], json!({ "math": 3 }));

    // Expanded: nested objects rendered through their own collection.
    let expanded = users
        .find_by_id_expanded(alice.id(), &["company", "friends"])
        .unwrap()
        .unwrap();
    let plain = users.to_plain(&expanded);
    assert_eq!(plain["_id"], json!(alice.id().to_hex()));
    assert_eq!(plain["company"]["_id"], json!(acme.id().to_hex()));
    assert_eq!(plain["company"]["name"], "Acme");
    assert_eq!(plain["friends"][0]["_id"], json!(bob.id().to_hex()));

    // Wire rendering matches the plain one.
    let wire: Json = serde_json::from_str(&users.to_wire(&expanded).unwrap()).unwrap();
    assert_eq!(wire, Json::Object(plain));
}

#[test]
fn test_write_path_enforces_schema() {
    let ctx = TestContext::new();
    register(&ctx.store, "Companies", &company(), &[]).unwrap();
    let users = register(&ctx.store, "Users", &user(), &["company"]).unwrap();

    // Missing required field.
    let result = users.insert_json(&json!({ "tags": [] }));
    assert!(matches!(result, Err(Error::Validation { ref path, .. }) if path == "name"));

    // Pattern translated to a match option.
    let result = users.insert_json(&json!({ "name": "A", "tags": [], "email": "nope" }));
    assert!(matches!(result, Err(Error::Validation { ref path, .. }) if path == "email"));

    // Undeclared fields are dropped.
    let stored = users
        .insert_json(&json!({ "name": "A", "tags": [], "role": "admin" }))
        .unwrap();
    assert!(stored.get("role").is_none());

    // Unique option.
    users
        .insert_json(&json!({ "name": "B", "tags": [], "email": "b@example.com" }))
        .unwrap();
    let result = users.insert_json(&json!({ "name": "C", "tags": [], "email": "b@example.com" }));
    assert!(matches!(result, Err(Error::UniqueViolation { .. })));
}

#[test]
fn test_expanded_document_can_be_saved_back() {
    let ctx = TestContext::new();
    let companies = register(&ctx.store, "Companies", &company(), &[]).unwrap();
    let users = register(&ctx.store, "Users", &user(), &["company"]).unwrap();

    let acme = companies.insert_json(&json!({ "name": "Acme" })).unwrap();
    let alice = users
        .insert_json(&json!({ "name": "Alice", "tags": [], "company": acme.id().to_hex() }))
        .unwrap();

    let mut expanded = users
        .find_by_id_expanded(alice.id(), &["company"])
        .unwrap()
        .unwrap();
    expanded.set("name", "Alice Smith");
    let updated = users.update(expanded).unwrap().unwrap();

    // The expanded company is stored as its key again.
    assert_eq!(updated.get("company"), Some(&Value::ObjectId(acme.id())));
    assert!(!updated.is_populated("company"));
}

#[test]
fn test_status_reports_registered_collections() {
    let ctx = TestContext::new();
    let companies = register(&ctx.store, "Companies", &company(), &[]).unwrap();
    register(&ctx.store, "Users", &user(), &[]).unwrap();
    companies.insert_json(&json!({ "name": "Acme" })).unwrap();

    let status = ctx.store.status().unwrap();
    assert_eq!(status.state, ConnectionState::Connected);
    assert_eq!(
        status.collections.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["Companies", "Users"]
    );

    let stats = status.collection("Companies").unwrap();
    assert_eq!(stats.namespace, "app.Companies");
    assert_eq!(stats.count, 1);
    assert_eq!(status.collection("Users").unwrap().count, 0);
}

#[test]
fn test_catalog_remembers_expandable_fields() {
    let ctx = TestContext::new();
    register(&ctx.store, "Companies", &company(), &[]).unwrap();
    register(&ctx.store, "Users", &user(), &["company", "friends"]).unwrap();

    let entry = ctx.store.catalog_entry("Users").unwrap();
    assert_eq!(entry.expandable, vec!["company", "friends"]);
    assert!(entry.timestamps);
    assert_eq!(entry.schema["company"]["ref"], "Companies");
}

#[test]
fn test_nested_objects_and_ids_in_descriptions() {
    let ctx = TestContext::new();
    let description = entity([
        ("title", string()),
        (
            "meta",
            TypeNode::from(strict_object([
                ("_id", object_id()),
                ("views", number()),
            ])),
        ),
    ]);
    let posts = register(&ctx.store, "Posts", &description, &[]).unwrap();

    let meta = posts.schema().fields().get("meta").unwrap();
    assert_eq!(meta.to_json()["type"], json!({ "views": { "type": "Number", "required": true } }));

    let stored = posts
        .insert_json(&json!({ "title": "Hello", "meta": { "views": 1 } }))
        .unwrap();
    let loaded: Document = posts.find_by_id(stored.id()).unwrap().unwrap();
    assert_eq!(loaded.id(), stored.id());
    assert!(ObjectId::parse_str(&stored.id().to_hex()).is_ok());
}

#[test]
fn test_batch_leaves_store_untouched_when_a_name_is_taken() {
    let ctx = TestContext::new();
    register(&ctx.store, "Users", &user(), &[]).unwrap();

    let result = Registrar::new(&ctx.store)
        .entity("Companies", company(), &[])
        .entity("Users", user(), &[])
        .register_all();

    assert!(matches!(result, Err(Error::DuplicateRegistration(name)) if name == "Users"));
    assert!(ctx.store.collection("Companies").is_none());
    assert_eq!(ctx.store.collection_names(), vec!["Users"]);
}

#[test]
fn test_identifier_shaped_map_is_rejected_not_retyped() {
    let ctx = TestContext::new();
    register(&ctx.store, "Companies", &company(), &[]).unwrap();
    let users = register(&ctx.store, "Users", &user(), &[]).unwrap();

    let result = users.insert_json(&json!({
        "name": "A",
        "tags": [],
        "scores": { "$oid": "0123456789abcdef01234567" },
    }));
    assert!(matches!(result, Err(Error::Validation { ref path, .. }) if path == "scores.$oid"));

    let stored = users
        .insert_json(&json!({ "name": "A", "tags": [], "scores": { "oid": 1 } }))
        .unwrap();
    let loaded = users.find_by_id(stored.id()).unwrap().unwrap();
    assert_eq!(loaded.get("scores"), stored.get("scores"));
}
