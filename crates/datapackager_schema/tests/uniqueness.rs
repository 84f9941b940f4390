//! Property tests for field uniqueness.
//!
//! Whatever sequence of creates, updates and deletes is applied, and whether
//! each one succeeds or not, no two stored fields share an index or a name.

use std::collections::HashSet;
use std::sync::Arc;

use datapackager_schema::{FieldInput, MemoryResourceStore, Resource, SchemaEngine};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create(u64, String),
    Update(u64, String),
    Delete(u64),
}

fn op() -> impl Strategy<Value = Op> {
    // Small spaces so collisions are common
    let index = 0u64..6;
    let name = prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(String::from);
    prop_oneof![
        (index.clone(), name.clone()).prop_map(|(i, n)| Op::Create(i, n)),
        (index.clone(), name).prop_map(|(i, n)| Op::Update(i, n)),
        index.prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Indices and names stay unique after every operation.
    #[test]
    fn prop_fields_stay_unique(ops in prop::collection::vec(op(), 1..40)) {
        let resources = Arc::new(MemoryResourceStore::new());
        resources.insert(Resource::new("r1", "pkg", "u"));
        let engine = SchemaEngine::new(resources);

        for op in ops {
            let _ = match op {
                Op::Create(i, n) => engine.field_create("r1", FieldInput::new(i, n)).map(|_| ()),
                Op::Update(i, n) => engine.field_update("r1", FieldInput::new(i, n)).map(|_| ()),
                Op::Delete(i) => engine.field_delete("r1", i),
            };

            let schema = engine.schema_show("r1").unwrap();
            let indexes: HashSet<u64> = schema.fields.iter().map(|f| f.index).collect();
            let names: HashSet<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
            prop_assert_eq!(indexes.len(), schema.fields.len());
            prop_assert_eq!(names.len(), schema.fields.len());
        }
    }

    /// A successful create is always visible to show, unchanged.
    #[test]
    fn prop_create_then_show(index in 0u64..1_000, name in "[a-z][a-z0-9_]{0,11}") {
        let resources = Arc::new(MemoryResourceStore::new());
        resources.insert(Resource::new("r1", "pkg", "u"));
        let engine = SchemaEngine::new(resources);

        let created = engine.field_create("r1", FieldInput::new(index, name.clone())).unwrap();
        let shown = engine.field_show("r1", index).unwrap();
        prop_assert_eq!(&shown, &created);
        prop_assert_eq!(shown.name, name);
    }
}
