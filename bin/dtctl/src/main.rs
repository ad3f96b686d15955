//! ---
//! dt_section: "05-networking-external-interfaces"
//! dt_subsection: "binary"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Control CLI for administrators of the defect tracker."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use dt_common::config::{AppConfig, LoadedAppConfig};
use dt_common::logging::init_tracing;

mod access;
mod defects;
mod vocab;

const DEFAULT_CONFIG: &str = "configs/dtrack.toml";

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Defect tracker administrative utility",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,
    /// Configuration file (defaults to configs/dtrack.toml or DT_CONFIG).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print defect and role vocabularies.
    Vocab(vocab::VocabArgs),
    /// Check a single token against a vocabulary.
    Validate(vocab::ValidateArgs),
    /// Check whether an actor holds at least a given role.
    Check(access::CheckArgs),
    /// Apply a change set to a defect record and print the result.
    Update(defects::UpdateArgs),
    /// Print status and severity counts for a set of defect records.
    Summary(defects::SummaryArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("dtctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let loaded = load_config(cli.config.as_ref())?;
    match &loaded.source {
        Some(_) => init_tracing("dtctl", &loaded.config.logging)?,
        None => dt_logging::init(),
    }
    if let Some(source) = &loaded.source {
        tracing::debug!(config = %source.display(), "configuration loaded");
    }

    let Some(command) = cli.command else {
        anyhow::bail!("no command given; run `dtctl --help` for usage");
    };
    match command {
        Commands::Vocab(args) => vocab::run_vocab(args),
        Commands::Validate(args) => vocab::run_validate(args),
        Commands::Check(args) => access::run(args, &loaded.config),
        Commands::Update(args) => defects::run_update(args, &loaded.config),
        Commands::Summary(args) => defects::run_summary(args),
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedAppConfig> {
    match explicit {
        Some(path) => Ok(LoadedAppConfig {
            config: AppConfig::from_file(path)?,
            source: Some(path.clone()),
        }),
        None => AppConfig::load_or_default(&[PathBuf::from(DEFAULT_CONFIG)]),
    }
}
