//! RASA CLI: run persona-driven agents from the command line.
//!
//! Commands:
//! - `list`     List personas in the apps directory
//! - `describe` Show a persona's configuration and expected preferences
//! - `run`      Run a persona on one input

use anyhow::Result;
use clap::{Parser, Subcommand};
use rasa::config::Settings;
use rasa::persona::PersonaCatalog;
use std::path::PathBuf;

mod commands;
mod extensions;
mod logging;

#[derive(Parser)]
#[command(
    name = "rasa",
    about = "RASA: run persona-driven, memory-aware agents from the command line",
    after_help = "Examples:\n  rasa list\n  rasa describe --persona travel_concierge\n  \
                  rasa run --persona travel_concierge --input \"Plan a weekend in Italy\" \
                  --preferences region=europe --preferences travel_style=relaxed",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding one sub-directory per persona
    #[arg(long, global = true, default_value = "apps", env = "RASA_APPS_DIR")]
    apps_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available personas
    List,

    /// Describe a persona, its stages and expected preferences
    Describe {
        /// Persona name (folder under the apps directory)
        #[arg(long)]
        persona: String,
    },

    /// Run a persona on an input
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    logging::init_logging(cli.verbose, settings.debug, cli.log_json)?;

    let catalog = PersonaCatalog::new(cli.apps_dir);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::List => commands::list::run(&catalog, &mut stdout)?,
        Commands::Describe { persona } => commands::describe::run(&catalog, &persona, &mut stdout)?,
        Commands::Run(args) => commands::run::run(&catalog, &args, &settings, &mut stdout).await?,
    }

    Ok(())
}
