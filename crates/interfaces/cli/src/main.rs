mod catalog_cmds;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cablecalc_catalog::{CatalogSources, Session, Tolerance, sources_from_config};
use cablecalc_config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "cablecalc",
    version,
    about = "Cable length calculator with a shared connector catalog"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute the cut length for a cable with a connector on each end.
    Calc {
        first: String,
        second: String,
        /// Cable length in millimetres.
        #[arg(long)]
        length: f64,
        #[command(flatten)]
        tolerance: ToleranceArgs,
    },
    /// Show every connector, sorted by name.
    List,
    /// Add a connector (name is upper-cased).
    Add {
        name: String,
        /// Shrink size in millimetres.
        size: f64,
    },
    /// Rename a connector and/or change its size.
    Edit {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        size: Option<f64>,
    },
    /// Remove a connector from every catalog store.
    Delete {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Merge the spreadsheet and the local file and write the result to both.
    Sync,
    /// Show configuration and the reachability of each catalog store.
    #[command(visible_alias = "doctor")]
    Status,
    /// Convert between length units.
    Convert {
        #[arg(value_enum)]
        kind: CliConversion,
        value: f64,
    },
    /// Run several commands against one session.
    Shell,
}

#[derive(Debug, Clone, Copy, Args)]
#[group(multiple = false)]
struct ToleranceArgs {
    /// Tolerance in millimetres.
    #[arg(long = "tol-mm", allow_hyphen_values = true)]
    tol_mm: Option<f64>,
    /// Tolerance as a percentage of the cable length.
    #[arg(long = "tol-percent", allow_hyphen_values = true)]
    tol_percent: Option<f64>,
}

impl ToleranceArgs {
    fn tolerance(self) -> Tolerance {
        match (self.tol_mm, self.tol_percent) {
            (_, Some(percent)) => Tolerance::Percent(percent),
            (Some(mm), None) => Tolerance::Millimeters(mm),
            (None, None) => Tolerance::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliConversion {
    MToMm,
    MToCm,
    CmToMm,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let sources = sources_from_config(&config);
    let command = cli.command.unwrap_or(Commands::List);

    if matches!(command, Commands::Shell) {
        return interactive::run_shell(&config, &cli.config, &sources);
    }

    let mut session = Session::open(&sources);
    dispatch(command, &config, &cli.config, &sources, &mut session)
}

/// Run one command against `session`.  Shared by one-shot mode and the shell.
fn dispatch(
    command: Commands,
    config: &AppConfig,
    config_path: &Path,
    sources: &CatalogSources,
    session: &mut Session,
) -> Result<()> {
    match command {
        Commands::Calc {
            first,
            second,
            length,
            tolerance,
        } => catalog_cmds::run_calc(session, &first, &second, length, tolerance.tolerance())?,
        Commands::List => catalog_cmds::run_list(session),
        Commands::Add { name, size } => catalog_cmds::run_add(session, sources, &name, size)?,
        Commands::Edit { name, rename, size } => {
            catalog_cmds::run_edit(session, sources, &name, rename.as_deref(), size)?
        }
        Commands::Delete { name, yes } => catalog_cmds::run_delete(session, sources, &name, yes)?,
        Commands::Sync => catalog_cmds::run_sync(session, sources)?,
        Commands::Status => catalog_cmds::run_status(config, config_path, sources),
        Commands::Convert { kind, value } => catalog_cmds::run_convert(kind, value),
        Commands::Shell => println!("already in a shell"),
    }
    Ok(())
}
