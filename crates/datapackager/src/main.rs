//! Data Packager command line
//!
//! - `infer`: infer a schema from a local CSV file
//! - `action`: run a named resource schema action against the catalogue
//! - `resource`: add and list catalogue entries

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use datapackager_logging::{init_logging, LogConfig};
use tracing::debug;

mod cli;

use cli::action::ActionArgs;
use cli::config::DataPackagerConfig;
use cli::infer::InferArgs;
use cli::resource::ResourceCommands;

#[derive(Parser, Debug)]
#[command(name = "datapackager", version, about = "Resource schemas and CSV type inference")]
struct Cli {
    /// Mirror debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.datapackager/config.toml)
    #[arg(long, global = true, env = "DATAPACKAGER_CONFIG")]
    config: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Infer a schema from a CSV file
    Infer(InferArgs),

    /// Run a schema action, e.g. resource_schema_field_create
    Action(ActionArgs),

    /// Manage the resource catalogue
    Resource {
        #[command(subcommand)]
        command: ResourceCommands,
    },
}

fn run(cli: Cli) -> Result<()> {
    let config = DataPackagerConfig::load_or_default(cli.config.as_deref())?;
    debug!(store = %config.store_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Infer(args) => cli::infer::run(args, &config),
        Commands::Action(args) => cli::action::run(args, &config),
        Commands::Resource { command } => cli::resource::run(command, &config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(LogConfig {
        app_name: "datapackager",
        verbose: cli.verbose,
        no_file: cli.no_log_file,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging unavailable: {:#}", err);
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(1)
        }
    }
}
