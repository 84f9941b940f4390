//! The resource collaborator.
//!
//! The schema engine never creates or deletes resources. It reads them,
//! writes back their `schema` string, and asks where an uploaded file lives.
//! Anything that can do that implements [`ResourceStore`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// `url_type` marking a file stored alongside the catalogue.
pub const URL_TYPE_UPLOAD: &str = "upload";

/// Errors reported by a [`ResourceStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource {0} has no local file (remote URL)")]
    NoLocalFile(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A resource record. Only the attributes the engine touches are typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,

    /// Owning dataset.
    #[serde(default)]
    pub package_id: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_type: Option<String>,

    /// The schema document as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, package_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            package_id: package_id.into(),
            url: url.into(),
            name: None,
            url_type: None,
            schema: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn uploaded(mut self) -> Self {
        self.url_type = Some(URL_TYPE_UPLOAD.to_string());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn is_upload(&self) -> bool {
        self.url_type.as_deref() == Some(URL_TYPE_UPLOAD)
    }

    /// Last path segment of the URL, without query or fragment.
    pub fn file_name(&self) -> Option<&str> {
        url_file_name(&self.url)
    }
}

pub(crate) fn url_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| {
            !segment.is_empty() && !segment.ends_with(':') && !matches!(*segment, "." | "..")
        })
}

/// Where an uploaded resource's file lives.
///
/// With a storage directory, uploads sit at `<storage_dir>/<id>/<file name>`;
/// without one the URL is taken as a local path.
pub(crate) fn upload_path(storage_dir: Option<&Path>, resource: &Resource) -> Result<PathBuf, StoreError> {
    if !resource.is_upload() {
        return Err(StoreError::NoLocalFile(resource.id.clone()));
    }
    match storage_dir {
        Some(dir) => {
            let file_name = resource
                .file_name()
                .ok_or_else(|| StoreError::NoLocalFile(resource.id.clone()))?;
            Ok(dir.join(&resource.id).join(file_name))
        }
        None => Ok(PathBuf::from(&resource.url)),
    }
}

/// Partial update: `None` leaves the attribute as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceUpdate {
    pub url: Option<String>,
    pub name: Option<String>,
    pub schema: Option<String>,
}

impl ResourceUpdate {
    pub fn apply(self, resource: &mut Resource) {
        if let Some(url) = self.url {
            resource.url = url;
        }
        if let Some(name) = self.name {
            resource.name = Some(name);
        }
        if let Some(schema) = self.schema {
            resource.schema = Some(schema);
        }
    }
}

/// Resource lookup and update, supplied by the host.
///
/// Implementations must be safe to share between threads; the schema engine
/// holds one behind an `Arc`.
pub trait ResourceStore: Send + Sync {
    /// Fetch a resource. Unknown ids fail with [`StoreError::NotFound`].
    fn get_resource(&self, id: &str) -> Result<Resource, StoreError>;

    /// Apply a partial update and return the stored result.
    fn update_resource(&self, id: &str, update: ResourceUpdate) -> Result<Resource, StoreError>;

    /// Local path of the resource's file; [`StoreError::NoLocalFile`] for
    /// resources that point at a remote URL.
    fn resource_file_path(&self, resource: &Resource) -> Result<PathBuf, StoreError>;

    /// Whether any resource already uses `name`.
    fn name_taken(&self, name: &str) -> Result<bool, StoreError>;
}
