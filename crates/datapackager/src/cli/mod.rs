//! CLI command implementations

pub mod action;
pub mod config;
pub mod infer;
pub mod output;
pub mod resource;

use std::sync::Arc;

use anyhow::Result;
use datapackager_schema::SchemaEngine;

use crate::cli::config::DataPackagerConfig;

/// Schema engine over the configured JSON catalogue.
pub fn open_engine(config: &DataPackagerConfig) -> Result<SchemaEngine> {
    let store = Arc::new(resource::catalogue(config));
    Ok(SchemaEngine::new(store).with_inference_options(config.inference_options()?))
}
