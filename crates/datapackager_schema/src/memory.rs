//! In-memory resource store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::resource::{upload_path, Resource, ResourceStore, ResourceUpdate, StoreError};

/// A [`ResourceStore`] backed by a map. Used for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: RwLock<HashMap<String, Resource>>,
    storage_dir: Option<PathBuf>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve uploads under `storage_dir` instead of treating URLs as paths.
    pub fn with_storage_dir(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            resources: RwLock::default(),
            storage_dir: Some(storage_dir.as_ref().to_path_buf()),
        }
    }

    /// Add or replace a resource.
    pub fn insert(&self, resource: Resource) {
        let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
        resources.insert(resource.id.clone(), resource);
    }

    pub fn len(&self) -> usize {
        self.resources.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceStore for MemoryResourceStore {
    fn get_resource(&self, id: &str) -> Result<Resource, StoreError> {
        let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
        resources
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn update_resource(&self, id: &str, update: ResourceUpdate) -> Result<Resource, StoreError> {
        let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
        let resource = resources
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(resource);
        Ok(resource.clone())
    }

    fn resource_file_path(&self, resource: &Resource) -> Result<PathBuf, StoreError> {
        upload_path(self.storage_dir.as_deref(), resource)
    }

    fn name_taken(&self, name: &str) -> Result<bool, StoreError> {
        let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
        Ok(resources.values().any(|r| r.name.as_deref() == Some(name)))
    }
}
