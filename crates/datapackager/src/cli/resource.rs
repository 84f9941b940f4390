//! `datapackager resource` - manage the local resource catalogue

use anyhow::{Context, Result};
use clap::Subcommand;
use datapackager_schema::{suggest_resource_name, JsonFileResourceStore, Resource};
use tracing::info;

use crate::cli::config::DataPackagerConfig;
use crate::cli::output::{print_json, resource_table};

#[derive(Debug, Subcommand)]
pub enum ResourceCommands {
    /// Add or replace a resource
    Add {
        /// Resource id
        id: String,

        /// Owning dataset
        #[arg(long)]
        package: String,

        /// Where the data lives; for uploads, the file name is taken from it
        #[arg(long)]
        url: String,

        /// Resource name (suggested from the URL when omitted)
        #[arg(long)]
        name: Option<String>,

        /// The file was uploaded into the storage directory
        #[arg(long)]
        upload: bool,
    },

    /// List resources
    List {
        #[arg(long)]
        json: bool,
    },
}

pub fn catalogue(config: &DataPackagerConfig) -> JsonFileResourceStore {
    JsonFileResourceStore::new(&config.store_path).with_storage_dir(&config.storage_dir)
}

/// Insert a resource, suggesting a name from its URL when none is given.
pub fn add_resource(
    store: &JsonFileResourceStore,
    id: String,
    package: String,
    url: String,
    name: Option<String>,
    upload: bool,
) -> Result<Resource> {
    let name = match name {
        Some(name) => name,
        None => suggest_resource_name(store, &url)
            .with_context(|| format!("Could not suggest a name for {}", url))?,
    };

    let mut resource = Resource::new(id, package, url).with_name(name);
    if upload {
        resource = resource.uploaded();
    }
    store
        .insert(resource.clone())
        .with_context(|| format!("Failed to write {}", store.path().display()))?;
    info!(id = %resource.id, name = ?resource.name, "Resource saved");
    Ok(resource)
}

pub fn run(command: ResourceCommands, config: &DataPackagerConfig) -> Result<()> {
    let store = catalogue(config);
    match command {
        ResourceCommands::Add {
            id,
            package,
            url,
            name,
            upload,
        } => {
            let resource = add_resource(&store, id, package, url, name, upload)?;
            print_json(&resource)
        }
        ResourceCommands::List { json } => {
            let resources = store.list()?;
            if json {
                print_json(&resources)
            } else if resources.is_empty() {
                println!("No resources in {}", store.path().display());
                Ok(())
            } else {
                println!("{}", resource_table(&resources));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_suggests_unique_names() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileResourceStore::new(dir.path().join("resources.json"));

        let first = add_resource(&store, "r1".into(), "pkg".into(), "http://x/Data File.csv".into(), None, false)
            .unwrap();
        assert_eq!(first.name.as_deref(), Some("data_file.csv"));

        let second = add_resource(&store, "r2".into(), "pkg".into(), "http://y/data file.csv".into(), None, true)
            .unwrap();
        assert_eq!(second.name.as_deref(), Some("data_file.csv_2"));
        assert!(second.is_upload());

        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_add_explicit_name() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileResourceStore::new(dir.path().join("resources.json"));
        let resource = add_resource(&store, "r1".into(), "pkg".into(), "http://x/a.csv".into(), Some("mine".into()), false)
            .unwrap();
        assert_eq!(resource.name.as_deref(), Some("mine"));
    }
}
