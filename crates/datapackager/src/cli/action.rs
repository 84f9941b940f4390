//! `datapackager action` - run a named schema action against the catalogue

use anyhow::{bail, Context, Result};
use clap::Args;
use datapackager_schema::ActionDispatcher;
use serde_json::{Map, Value};
use tracing::info;

use crate::cli::config::DataPackagerConfig;
use crate::cli::open_engine;
use crate::cli::output::print_json;

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Action name, e.g. resource_schema_field_create
    pub name: String,

    /// Parameters as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub params: String,
}

/// Parse `--params`, which must be a JSON object.
pub fn parse_params(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("--params is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("--params must be a JSON object, got {}", other),
    }
}

pub fn run(args: ActionArgs, config: &DataPackagerConfig) -> Result<()> {
    let params = parse_params(&args.params)?;
    let dispatcher = ActionDispatcher::new(open_engine(config)?);

    let result = dispatcher
        .call_named(&args.name, &params)
        .with_context(|| format!("Action '{}' failed", args.name))?;
    info!(action = %args.name, "Action completed");
    print_json(&result)
}
