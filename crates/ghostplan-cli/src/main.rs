use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod day_file;

#[derive(Parser)]
#[command(name = "ghostplan-cli", version, about = "Ghostplan CLI")]
struct Cli {
    /// Config file to use instead of ~/.config/ghostplan/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the free gaps of a day
    Gaps(commands::gaps::GapsArgs),
    /// Place a day's candidates into its gaps once
    Plan(commands::plan::PlanArgs),
    /// Keep placing suggestions until interrupted
    Watch(commands::watch::WatchArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Gaps(args) => commands::gaps::run(args, config_path),
        Commands::Plan(args) => commands::plan::run(args, config_path),
        Commands::Watch(args) => commands::watch::run(args, config_path),
        Commands::Config { action } => commands::config::run(action, config_path),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
