//! `datapackager infer` - infer a schema from a local CSV file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use datapackager_inference::{infer_schema_from_path, InferenceMode, InferenceOptions, InferredSchema};
use datapackager_schema::actions::parse_separator;
use tracing::info;

use crate::cli::config::DataPackagerConfig;
use crate::cli::output::{print_json, schema_table};

#[derive(Debug, Args)]
pub struct InferArgs {
    /// CSV file to read
    pub file: PathBuf,

    /// Column separator (sniffed when omitted); `tab` or `\t` for tabs
    #[arg(short, long)]
    pub separator: Option<String>,

    /// Only read the head of the file and skip statistics
    #[arg(long)]
    pub sample: bool,

    /// Bytes to read in sample mode
    #[arg(long, requires = "sample")]
    pub sample_bytes: Option<usize>,

    /// Print the schema as JSON
    #[arg(long)]
    pub json: bool,
}

impl InferArgs {
    /// Command line flags layered over the configured defaults.
    pub fn options(&self, config: &DataPackagerConfig) -> Result<InferenceOptions> {
        let mut options = config.inference_options()?;
        if let Some(separator) = &self.separator {
            options.separator =
                Some(parse_separator(separator).map_err(|e| anyhow::anyhow!("{}", e))?);
        }
        if self.sample {
            options.mode = InferenceMode::Sample;
        }
        if let Some(bytes) = self.sample_bytes {
            options.sample_bytes = bytes;
        }
        Ok(options)
    }
}

pub fn infer_file(path: &Path, options: &InferenceOptions) -> Result<InferredSchema> {
    let schema = infer_schema_from_path(path, options)
        .with_context(|| format!("Failed to infer schema for {}", path.display()))?;
    info!(path = %path.display(), fields = schema.fields.len(), "Schema inferred");
    Ok(schema)
}

pub fn run(args: InferArgs, config: &DataPackagerConfig) -> Result<()> {
    let options = args.options(config)?;
    let schema = infer_file(&args.file, &options)?;

    if args.json {
        print_json(&schema)
    } else {
        println!("{}", schema_table(&schema));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(file: PathBuf) -> InferArgs {
        InferArgs {
            file,
            separator: None,
            sample: false,
            sample_bytes: None,
            json: true,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = DataPackagerConfig::default();
        let mut args = args(PathBuf::from("x.csv"));
        args.separator = Some(";".to_string());
        args.sample = true;
        args.sample_bytes = Some(64);

        let options = args.options(&config).unwrap();
        assert_eq!(options.separator, Some(b';'));
        assert_eq!(options.mode, InferenceMode::Sample);
        assert_eq!(options.sample_bytes, 64);
    }

    #[test]
    fn test_bad_separator_flag() {
        let mut args = args(PathBuf::from("x.csv"));
        args.separator = Some("ab".to_string());
        assert!(args.options(&DataPackagerConfig::default()).is_err());
    }

    #[test]
    fn test_infer_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "id;score\n1;2.5\n2;3.5\n").unwrap();

        let options = args(path.clone()).options(&DataPackagerConfig::default()).unwrap();
        let schema = infer_file(&path, &options).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[1].name, "score");
        assert_eq!(schema.fields[1].field_type.as_str(), "number");
    }

    #[test]
    fn test_missing_file_has_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.csv");
        let err = infer_file(&path, &InferenceOptions::default()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to infer schema"));
    }
}
