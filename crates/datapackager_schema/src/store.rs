//! Schema Store
//!
//! Translates between a resource's `schema` string and [`Schema`].
//!
//! # Concurrency
//!
//! Every mutation is read whole schema → change in memory → write whole
//! schema. [`SchemaStore::mutate`] holds a per-resource mutex across that
//! round trip, so two mutations of the same resource through the same
//! `SchemaStore` are applied one after the other.
//!
//! The lock is in-process only. Another process writing to the same backing
//! store can still interleave and the later write wins; deployments must
//! keep a single writing process per store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::{SchemaError, ValidationError};
use crate::resource::{Resource, ResourceStore, ResourceUpdate, StoreError};
use crate::schema::Schema;

pub struct SchemaStore {
    resources: Arc<dyn ResourceStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SchemaStore {
    pub fn new(resources: Arc<dyn ResourceStore>) -> Self {
        Self {
            resources,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn resources(&self) -> &Arc<dyn ResourceStore> {
        &self.resources
    }

    /// Fetch a resource; an unknown id is a validation failure on
    /// `resource_id`.
    pub fn resource(&self, resource_id: &str) -> Result<Resource, SchemaError> {
        match self.resources.get_resource(resource_id) {
            Ok(resource) => Ok(resource),
            Err(StoreError::NotFound(_)) => {
                Err(ValidationError::single("resource_id", "Not found: Resource").into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current schema of a resource; `{fields: []}` when it has none yet.
    pub fn show(&self, resource_id: &str) -> Result<Schema, SchemaError> {
        let resource = self.resource(resource_id)?;
        parse_schema(&resource)
    }

    /// Serialize `schema` and write it back, re-supplying `url` and `name`.
    pub fn save(&self, resource_id: &str, schema: &Schema) -> Result<(), SchemaError> {
        let resource = self.resource(resource_id)?;
        self.write(&resource, schema)
    }

    /// Run `change` on the current schema under the resource's lock and
    /// persist the result if it succeeds. Nothing is written on error.
    pub fn mutate<T, F>(&self, resource_id: &str, change: F) -> Result<T, SchemaError>
    where
        F: FnOnce(&Resource, &mut Schema) -> Result<T, SchemaError>,
    {
        let lock = self.lock_for(resource_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let resource = self.resource(resource_id)?;
        let mut schema = parse_schema(&resource)?;
        let out = change(&resource, &mut schema)?;
        self.write(&resource, &schema)?;
        Ok(out)
    }

    fn write(&self, resource: &Resource, schema: &Schema) -> Result<(), SchemaError> {
        let json = serde_json::to_string(schema)?;
        self.resources.update_resource(
            &resource.id,
            ResourceUpdate {
                url: Some(resource.url.clone()),
                name: resource.name.clone(),
                schema: Some(json),
            },
        )?;
        info!(
            resource_id = %resource.id,
            fields = schema.fields.len(),
            "Schema saved"
        );
        Ok(())
    }

    fn lock_for(&self, resource_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(resource_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

pub(crate) fn parse_schema(resource: &Resource) -> Result<Schema, SchemaError> {
    let raw = match resource.schema.as_deref().map(str::trim) {
        None | Some("") => {
            debug!(resource_id = %resource.id, "No schema yet");
            return Ok(Schema::default());
        }
        Some(raw) => raw,
    };
    serde_json::from_str(raw).map_err(|e| {
        ValidationError::single("schema", format!("Invalid schema JSON: {}", e)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryResourceStore;
    use crate::schema::Field;

    fn store_with(resource: Resource) -> (Arc<MemoryResourceStore>, SchemaStore) {
        let resources = Arc::new(MemoryResourceStore::new());
        resources.insert(resource);
        let store = SchemaStore::new(resources.clone());
        (resources, store)
    }

    #[test]
    fn test_show_without_schema() {
        let (_, store) = store_with(Resource::new("r1", "p", "u"));
        assert_eq!(store.show("r1").unwrap(), Schema::default());
    }

    #[test]
    fn test_show_blank_schema_string() {
        let (_, store) = store_with(Resource::new("r1", "p", "u").with_schema("  "));
        assert!(store.show("r1").unwrap().fields.is_empty());
    }

    #[test]
    fn test_unknown_resource_is_validation_error() {
        let (_, store) = store_with(Resource::new("r1", "p", "u"));
        let err = store.show("missing").unwrap_err();
        let validation = err.as_validation().unwrap();
        assert_eq!(validation.messages("resource_id"), ["Not found: Resource".to_string()]);
    }

    #[test]
    fn test_invalid_json_is_validation_error() {
        let (_, store) = store_with(Resource::new("r1", "p", "u").with_schema("{oops"));
        let err = store.show("r1").unwrap_err();
        assert!(err.as_validation().unwrap().contains("schema"));
    }

    #[test]
    fn test_save_resupplies_url_and_name() {
        let (resources, store) =
            store_with(Resource::new("r1", "p", "http://x.org/a.csv").with_name("a.csv"));
        let mut schema = Schema::default();
        schema.fields.push(Field::new(0, "a"));
        store.save("r1", &schema).unwrap();

        let resource = resources.get_resource("r1").unwrap();
        assert_eq!(resource.url, "http://x.org/a.csv");
        assert_eq!(resource.name.as_deref(), Some("a.csv"));
        assert_eq!(store.show("r1").unwrap(), schema);
    }

    #[test]
    fn test_failed_mutation_writes_nothing() {
        let (resources, store) = store_with(Resource::new("r1", "p", "u"));
        let result: Result<(), SchemaError> = store.mutate("r1", |_, schema| {
            schema.fields.push(Field::new(0, "a"));
            Err(ValidationError::single("name", "nope").into())
        });
        assert!(result.is_err());
        assert!(resources.get_resource("r1").unwrap().schema.is_none());
    }
}
