//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Args, Parser, Subcommand};
use commands::{
    CodingCommandInput, run_commit, run_config_check, run_config_show, run_family_code, run_info,
    run_next_serial, run_preview,
};
use error::CliError;
use format::{CliOutput, OutputArgs, OutputMode};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Env prefix for coding overrides (`SKC_MAX_PARENT_DEPTH`, ...).
const ENV_PREFIX: &str = "SKC_";

#[derive(Debug, Parser)]
#[command(
    name = "skc",
    version,
    about = "Product family, short and feature code CLI",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by the commands that code a family.
#[derive(Debug, Args)]
struct CodingArgs {
    /// Catalog snapshot file (JSON).
    #[arg(long)]
    catalog: PathBuf,
    /// Category identifier.
    #[arg(long)]
    category: u64,
    /// Family coding metadata as a JSON object.
    #[arg(long)]
    metadata: String,
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Render the family code for a category and its metadata.
    FamilyCode {
        #[command(flatten)]
        coding: CodingArgs,
    },
    /// Preview family, short and feature codes without persisting them.
    Preview {
        #[command(flatten)]
        coding: CodingArgs,
        /// Variant attribute sets as a JSON array of objects.
        #[arg(long)]
        variants: String,
    },
    /// Show the next free serial under a short-code prefix.
    NextSerial {
        /// Catalog snapshot file (JSON).
        #[arg(long)]
        catalog: PathBuf,
        /// Seven-character short-code prefix.
        #[arg(long)]
        prefix: String,
    },
    /// Generate codes and commit the family with its variants.
    Commit {
        #[command(flatten)]
        coding: CodingArgs,
        /// Variant attribute sets as a JSON array of objects.
        #[arg(long)]
        variants: String,
        /// Write the committed records back into the catalog snapshot.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Load, merge and validate the config, reporting only success or the first error.
    Check {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
    /// Print the effective config (TOML in text mode).
    Show {
        #[command(flatten)]
        source: ConfigSourceArgs,
    },
}

/// Where `config` commands read their layers from; `SKC_*` variables apply last.
#[derive(Debug, Args)]
struct ConfigSourceArgs {
    /// Config file (`.json` or `.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Partial config as JSON, applied over the file.
    #[arg(long)]
    overrides_json: Option<String>,
}

impl CodingArgs {
    fn to_input<'a>(&'a self, variants: Option<&'a str>) -> CodingCommandInput<'a> {
        CodingCommandInput {
            catalog: self.catalog.as_path(),
            category: self.category,
            metadata: self.metadata.as_str(),
            variants,
            config: self.config.as_deref(),
        }
    }
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match output.write() {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

/// Install the stderr `tracing` subscriber; `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => Ok(run_info(mode)),
        Commands::Config { command } => {
            let env = collect_scoped_env(ENV_PREFIX);
            match command {
                ConfigCommands::Check { source } => Ok(run_config_check(
                    mode,
                    &env,
                    source.config.as_deref(),
                    source.overrides_json.as_deref(),
                )),
                ConfigCommands::Show { source } => run_config_show(
                    mode,
                    &env,
                    source.config.as_deref(),
                    source.overrides_json.as_deref(),
                ),
            }
        },
        Commands::FamilyCode { coding } => run_family_code(mode, &coding.to_input(None)),
        Commands::Preview { coding, variants } => {
            run_preview(mode, &coding.to_input(Some(variants.as_str())))
        },
        Commands::NextSerial { catalog, prefix } => run_next_serial(mode, catalog, prefix),
        Commands::Commit {
            coding,
            variants,
            save,
        } => run_commit(mode, &coding.to_input(Some(variants.as_str())), *save),
    }
}

pub(crate) fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}
