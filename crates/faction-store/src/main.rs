//! Faction data directory tool
//!
//! Examples:
//!   cargo run -p faction-store -- check
//!   cargo run -p faction-store -- --config factions.toml show Thornwood
//!   cargo run -p faction-store -- init-config > factions.toml

use clap::{Parser, Subcommand};
use faction_data::{FactionId, FactionRecord, WarningLog};
use faction_store::{default_config_toml, Factions, StoreConfig, StoreError};
use std::cell::Cell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Inspect and maintain a faction data directory
#[derive(Parser, Debug)]
#[command(name = "factions")]
#[command(about = "Inspect and maintain a faction data directory")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every faction and report problems
    Check,
    /// Print one faction as JSON
    Show {
        /// Faction id or name
        faction: String,
    },
    /// Create a new faction
    Create { name: String },
    /// Rename an existing faction
    Rename {
        /// Faction id or name
        faction: String,
        name: String,
    },
    /// Print the default configuration
    InitConfig,
}

/// Forwards warnings to tracing and counts them.
struct CountingWarnings(Rc<Cell<usize>>);

impl WarningLog for CountingWarnings {
    fn warning(&self, message: &str) {
        self.0.set(self.0.get() + 1);
        tracing::warn!("{}", message);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(false)
        .init();

    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<StoreConfig, StoreError> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(command: Command, config: &StoreConfig) -> Result<(), StoreError> {
    if let Command::InitConfig = command {
        print!("{}", default_config_toml());
        return Ok(());
    }

    let warnings = Rc::new(Cell::new(0));
    let mut factions =
        Factions::from_config(config)?.with_warnings(Box::new(CountingWarnings(warnings.clone())));
    let loaded = factions.load()?;

    match command {
        Command::Check => {
            println!(
                "{} faction(s) in {}, {} warning(s)",
                loaded,
                factions.provider().dir().display(),
                warnings.get()
            );
            for id in factions.registry().faction_ids() {
                if let Some(faction) = factions.get(id) {
                    println!("  {} {} ({} members)", id, faction.name(), faction.members().len());
                }
            }
        }
        Command::Show { faction } => {
            let record = lookup(&factions, &faction)?;
            let mut value = record.to_value();
            value["hasHome"] = factions.has_home(record.id()).into();
            let json = serde_json::to_string_pretty(&value).map_err(|source| {
                faction_store::ProviderError::Json {
                    path: factions.provider().path_for(record.id()),
                    source,
                }
            })?;
            println!("{}", json);
        }
        Command::Create { name } => {
            let id = factions.create_faction(&name)?;
            factions.save_dirty()?;
            println!("{}", id);
        }
        Command::Rename { faction, name } => {
            let id = lookup(&factions, &faction)?.id().clone();
            factions.rename(&id, &name)?;
            factions.save_dirty()?;
        }
        Command::InitConfig => {}
    }
    Ok(())
}

fn lookup<'a>(factions: &'a Factions, key: &str) -> Result<&'a FactionRecord, StoreError> {
    let id = FactionId::from(key);
    factions
        .get(&id)
        .or_else(|| factions.find_by_name(key))
        .ok_or(StoreError::UnknownFaction(id))
}
