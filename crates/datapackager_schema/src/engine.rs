//! Schema Engine
//!
//! The entry point for every schema operation. Field operations live in
//! [`crate::fields`], key operations in [`crate::keys`].

use std::sync::Arc;

use datapackager_inference::{infer_schema_from_path, InferenceOptions};
use tracing::info;

use crate::error::SchemaError;
use crate::naming::suggest_resource_name;
use crate::resource::ResourceStore;
use crate::schema::Schema;
use crate::store::SchemaStore;

pub struct SchemaEngine {
    pub(crate) store: SchemaStore,
    inference: InferenceOptions,
}

impl SchemaEngine {
    pub fn new(resources: Arc<dyn ResourceStore>) -> Self {
        Self {
            store: SchemaStore::new(resources),
            inference: InferenceOptions::default(),
        }
    }

    /// Options used by [`SchemaEngine::infer`].
    pub fn with_inference_options(mut self, options: InferenceOptions) -> Self {
        self.inference = options;
        self
    }

    pub fn inference_options(&self) -> &InferenceOptions {
        &self.inference
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// `resource_schema_show`
    pub fn schema_show(&self, resource_id: &str) -> Result<Schema, SchemaError> {
        self.store.show(resource_id)
    }

    /// Infer the schema of the resource's uploaded file with the engine's
    /// options and store it, replacing any previous schema.
    pub fn infer(&self, resource_id: &str) -> Result<Schema, SchemaError> {
        self.infer_with(resource_id, &self.inference)
    }

    pub fn infer_with(
        &self,
        resource_id: &str,
        options: &InferenceOptions,
    ) -> Result<Schema, SchemaError> {
        let resources = self.store.resources().clone();
        self.store.mutate(resource_id, |resource, schema| {
            let path = resources.resource_file_path(resource)?;
            let inferred = infer_schema_from_path(&path, options)?;
            *schema = serde_json::from_value(serde_json::to_value(&inferred)?)?;
            info!(
                resource_id,
                path = %path.display(),
                fields = schema.fields.len(),
                "Schema inferred"
            );
            Ok(schema.clone())
        })
    }

    /// Free resource name for `url`.
    pub fn suggest_name(&self, url: &str) -> Result<String, SchemaError> {
        Ok(suggest_resource_name(self.store.resources().as_ref(), url)?)
    }
}
