//! Primary and foreign key operations.

use std::sync::Arc;

use datapackager_schema::{
    FieldInput, ForeignKeyInput, MemoryResourceStore, Resource, SchemaEngine, SchemaError,
};

/// Two resources in `pkg` and one in another dataset, each with fields.
fn engine() -> SchemaEngine {
    let resources = Arc::new(MemoryResourceStore::new());
    resources.insert(Resource::new("orders", "pkg", "http://x/orders.csv").with_name("orders"));
    resources.insert(Resource::new("people", "pkg", "http://x/people.csv").with_name("people"));
    resources.insert(Resource::new("elsewhere", "other", "http://y/e.csv").with_name("e"));
    let engine = SchemaEngine::new(resources);

    for (i, name) in ["id", "person_id", "person_region"].iter().enumerate() {
        engine.field_create("orders", FieldInput::new(i as u64, *name)).unwrap();
    }
    for (i, name) in ["id", "region"].iter().enumerate() {
        engine.field_create("people", FieldInput::new(i as u64, *name)).unwrap();
    }
    engine.field_create("elsewhere", FieldInput::new(0, "id")).unwrap();
    engine
}

fn messages(err: &SchemaError, attr: &str) -> Vec<String> {
    err.as_validation()
        .unwrap_or_else(|| panic!("expected validation error, got {:?}", err))
        .messages(attr)
        .to_vec()
}

// =============================================================================
// PRIMARY KEY
// =============================================================================

/// Test update, show and delete of a primary key
#[test]
fn test_pkey_lifecycle() {
    let engine = engine();
    assert!(engine.pkey_show("orders").unwrap().is_empty());

    let pkey = engine.pkey_update("orders", vec!["id".into()]).unwrap();
    assert_eq!(pkey, vec!["id"]);
    assert_eq!(engine.pkey_show("orders").unwrap(), vec!["id"]);

    engine.pkey_delete("orders").unwrap();
    assert!(engine.pkey_show("orders").unwrap().is_empty());
    // Deleting again is fine
    engine.pkey_delete("orders").unwrap();
}

/// Test unknown names and an empty key are rejected
#[test]
fn test_pkey_validation() {
    let engine = engine();
    let err = engine.pkey_update("orders", vec!["id".into(), "nope".into()]).unwrap_err();
    assert_eq!(messages(&err, "primary_key"), vec!["Field 'nope' does not exist"]);

    let err = engine.pkey_update("orders", Vec::new()).unwrap_err();
    assert_eq!(messages(&err, "primary_key"), vec!["Missing value"]);
    assert!(engine.pkey_show("orders").unwrap().is_empty());
}

/// Test a name repeated in the primary key is rejected once
#[test]
fn test_pkey_repeated_name() {
    let engine = engine();
    let err = engine
        .pkey_update("orders", vec!["id".into(), "id".into(), "id".into()])
        .unwrap_err();
    assert_eq!(
        messages(&err, "primary_key"),
        vec!["Field 'id' is listed more than once"]
    );
    assert!(engine.pkey_show("orders").unwrap().is_empty());
}

// =============================================================================
// FOREIGN KEYS
// =============================================================================

/// Test creating a composite foreign key with a generated uid
#[test]
fn test_fkey_create_generates_uid() {
    let engine = engine();
    let key = engine
        .fkey_create(
            "orders",
            ForeignKeyInput::new(["person_id", "person_region"], "people", ["id", "region"]),
        )
        .unwrap();

    assert_eq!(key.fkey_uid.len(), 36);
    assert_eq!(key.reference.resource, "people");
    assert_eq!(key.reference.fields, vec!["id", "region"]);
    assert_eq!(engine.fkey_show("orders", &key.fkey_uid).unwrap(), key);
    assert_eq!(engine.fkey_list("orders").unwrap(), vec![key]);
}

/// Test mismatched field list lengths fail validation
#[test]
fn test_fkey_length_symmetry() {
    let engine = engine();
    let err = engine
        .fkey_create(
            "orders",
            ForeignKeyInput::new(["person_id", "person_region"], "people", ["id"]),
        )
        .unwrap_err();
    assert_eq!(messages(&err, "referenced_field").len(), 1);
    assert!(engine.fkey_list("orders").unwrap().is_empty());
}

/// Test every reference problem is reported
#[test]
fn test_fkey_reference_validation() {
    let engine = engine();

    let err = engine
        .fkey_create("orders", ForeignKeyInput::new(["missing"], "people", ["nope"]))
        .unwrap_err();
    assert_eq!(messages(&err, "fields"), vec!["Field 'missing' does not exist"]);
    assert_eq!(
        messages(&err, "referenced_field"),
        vec!["Field 'nope' does not exist in the referenced resource"]
    );

    let err = engine
        .fkey_create("orders", ForeignKeyInput::new(["id"], "ghost", ["id"]))
        .unwrap_err();
    assert_eq!(messages(&err, "referenced_id"), vec!["Not found: Resource"]);

    let err = engine
        .fkey_create("orders", ForeignKeyInput::new(["id"], "elsewhere", ["id"]))
        .unwrap_err();
    assert_eq!(
        messages(&err, "referenced_id"),
        vec!["Referenced resource must belong to the same dataset"]
    );
}

/// Test a resource may reference itself
#[test]
fn test_fkey_self_reference() {
    let engine = engine();
    let key = engine
        .fkey_create("orders", ForeignKeyInput::new(["person_id"], "orders", ["id"]))
        .unwrap();
    assert_eq!(key.reference.resource, "orders");
}

/// Test a supplied uid must be unused on create
#[test]
fn test_fkey_uid_collision() {
    let engine = engine();
    let input = ForeignKeyInput::new(["person_id"], "people", ["id"]).with_uid("k1");
    engine.fkey_create("orders", input.clone()).unwrap();

    let err = engine.fkey_create("orders", input).unwrap_err();
    assert_eq!(messages(&err, "fkey_uid"), vec!["Foreign key uid 'k1' is already in use"]);
    assert_eq!(engine.fkey_list("orders").unwrap().len(), 1);
}

/// Test update replaces by uid and delete fails for unknown uids
#[test]
fn test_fkey_update_and_delete() {
    let engine = engine();
    engine
        .fkey_create(
            "orders",
            ForeignKeyInput::new(["person_id"], "people", ["id"]).with_uid("k1"),
        )
        .unwrap();

    let updated = engine
        .fkey_update(
            "orders",
            ForeignKeyInput::new(["person_region"], "people", ["region"]).with_uid("k1"),
        )
        .unwrap();
    let keys = engine.fkey_list("orders").unwrap();
    assert_eq!(keys, vec![updated]);
    assert_eq!(keys[0].fields, vec!["person_region"]);

    // Update without a uid is rejected
    let err = engine
        .fkey_update("orders", ForeignKeyInput::new(["id"], "people", ["id"]))
        .unwrap_err();
    assert_eq!(messages(&err, "fkey_uid"), vec!["Missing value"]);

    engine.fkey_delete("orders", "k1").unwrap();
    assert!(engine.fkey_list("orders").unwrap().is_empty());
    let err = engine.fkey_delete("orders", "k1").unwrap_err();
    assert!(err.as_validation().unwrap().contains("fkey_uid"));
    assert!(engine.fkey_show("orders", "k1").is_err());
}
