//! Resource catalogue kept in a JSON file.
//!
//! Layout on disk:
//!
//! ```json
//! {"resources": [{"id": "...", "package_id": "...", "url": "...", "schema": "..."}]}
//! ```
//!
//! Every call reads the whole file; every update rewrites it through a
//! temporary file and a rename. The file is assumed to have one writing
//! process at a time.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resource::{upload_path, Resource, ResourceStore, ResourceUpdate, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalogue {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug)]
pub struct JsonFileResourceStore {
    path: PathBuf,
    storage_dir: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl JsonFileResourceStore {
    /// Use the catalogue at `path`. A missing file reads as an empty
    /// catalogue and is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storage_dir: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Resolve uploaded files under `storage_dir`.
    pub fn with_storage_dir(mut self, storage_dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(storage_dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add or replace a resource by id.
    pub fn insert(&self, resource: Resource) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut catalogue = self.load()?;
        match catalogue.resources.iter_mut().find(|r| r.id == resource.id) {
            Some(existing) => *existing = resource,
            None => catalogue.resources.push(resource),
        }
        self.store(&catalogue)
    }

    pub fn list(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(self.load()?.resources)
    }

    fn load(&self) -> Result<Catalogue, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Catalogue::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Catalogue::default()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn store(&self, catalogue: &Catalogue) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let content = serde_json::to_string_pretty(catalogue)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), resources = catalogue.resources.len(), "Catalogue written");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResourceStore for JsonFileResourceStore {
    fn get_resource(&self, id: &str) -> Result<Resource, StoreError> {
        self.load()?
            .resources
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn update_resource(&self, id: &str, update: ResourceUpdate) -> Result<Resource, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut catalogue = self.load()?;
        let resource = catalogue
            .resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(resource);
        let updated = resource.clone();
        self.store(&catalogue)?;
        Ok(updated)
    }

    fn resource_file_path(&self, resource: &Resource) -> Result<PathBuf, StoreError> {
        upload_path(self.storage_dir.as_deref(), resource)
    }

    fn name_taken(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .load()?
            .resources
            .iter()
            .any(|r| r.name.as_deref() == Some(name)))
    }
}
